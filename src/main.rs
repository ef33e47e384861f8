use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use energydash::config::{split_list, Config};
use energydash::dashboard::Dashboard;
use energydash::logging::{log, obj, v_str, Domain, Level};

#[derive(Debug, Default)]
struct Args {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    plants: Option<Vec<String>>,
    threshold: Option<f64>,
}

fn usage() -> &'static str {
    "usage: energydash [--start YYYY-MM-DD] [--end YYYY-MM-DD] [--plants A,B] [--threshold MWH]"
}

fn parse_date(flag: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("{} expects YYYY-MM-DD, got {}", flag, raw))
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(flag) = it.next() {
        if flag == "-h" || flag == "--help" {
            return Err(anyhow!(usage()));
        }
        let value = it
            .next()
            .ok_or_else(|| anyhow!("{} needs a value\n{}", flag, usage()))?;
        match flag.as_str() {
            "--start" => args.start = Some(parse_date(&flag, &value)?),
            "--end" => args.end = Some(parse_date(&flag, &value)?),
            "--plants" => args.plants = Some(split_list(&value)),
            "--threshold" => {
                args.threshold = Some(
                    value
                        .parse()
                        .with_context(|| format!("--threshold expects a number, got {}", value))?,
                )
            }
            other => return Err(anyhow!("unknown flag {}\n{}", other, usage())),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let cfg = Config::from_env();
    let dash = Dashboard::new(cfg)?;

    let selection = match dash.selection(args.start, args.end, args.plants.as_deref(), args.threshold) {
        Ok(sel) => sel,
        Err(err) => {
            log(
                Level::Warn,
                Domain::Session,
                "selection_rejected",
                obj(&[("msg", v_str(&err.to_string()))]),
            );
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    let view = dash.compute(&selection);
    println!("{}", view.to_json());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_all_flags() {
        let parsed = args(&[
            "--start", "2023-02-01", "--end", "2023-02-28", "--plants", "Steel 1,Foundry", "--threshold", "480",
        ])
        .unwrap();
        assert_eq!(parsed.start, NaiveDate::from_ymd_opt(2023, 2, 1));
        assert_eq!(parsed.end, NaiveDate::from_ymd_opt(2023, 2, 28));
        assert_eq!(parsed.plants, Some(vec!["Steel 1".to_string(), "Foundry".to_string()]));
        assert_eq!(parsed.threshold, Some(480.0));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(args(&["--start", "02/01/2023"]).is_err());
        assert!(args(&["--threshold"]).is_err());
        assert!(args(&["--verbose", "1"]).is_err());
    }
}
