use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Energy,
    Water,
    Emissions,
}

/// A savings opportunity shown alongside the alerts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    pub description: &'static str,
    pub estimated_saving: &'static str,
}

pub fn opportunities() -> Vec<Opportunity> {
    vec![
        Opportunity {
            kind: OpportunityKind::Energy,
            description: "Solar panel installation at the primary steel plant",
            estimated_saving: "15% energy cost",
        },
        Opportunity {
            kind: OpportunityKind::Water,
            description: "Recirculation system for the cooling process",
            estimated_saving: "2.5M liters/year",
        },
        Opportunity {
            kind: OpportunityKind::Emissions,
            description: "Upgrade to high-efficiency furnaces",
            estimated_saving: "8% CO2 reduction",
        },
    ]
}
