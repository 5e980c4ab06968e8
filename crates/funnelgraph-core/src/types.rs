use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of step a funnel node represents.
///
/// Unknown kinds round-trip through `Other` so graphs built by newer
/// editors still analyze; the string form is the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum StepType {
    LandingPage,
    OptInForm,
    EmailSequence,
    SalesPage,
    Checkout,
    Upsell,
    Webinar,
    ThankYou,
    Survey,
    Other(String),
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepType::LandingPage => "landing-page",
            StepType::OptInForm => "opt-in-form",
            StepType::EmailSequence => "email-sequence",
            StepType::SalesPage => "sales-page",
            StepType::Checkout => "checkout",
            StepType::Upsell => "upsell",
            StepType::Webinar => "webinar",
            StepType::ThankYou => "thank-you",
            StepType::Survey => "survey",
            StepType::Other(s) => s.as_str(),
        };
        write!(f, "{}", s)
    }
}

impl FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landing-page" => Ok(StepType::LandingPage),
            "opt-in-form" => Ok(StepType::OptInForm),
            "email-sequence" => Ok(StepType::EmailSequence),
            "sales-page" => Ok(StepType::SalesPage),
            "checkout" => Ok(StepType::Checkout),
            "upsell" => Ok(StepType::Upsell),
            "webinar" => Ok(StepType::Webinar),
            "thank-you" => Ok(StepType::ThankYou),
            "survey" => Ok(StepType::Survey),
            other => Ok(StepType::Other(other.to_string())),
        }
    }
}

impl From<StepType> for String {
    fn from(t: StepType) -> Self {
        t.to_string()
    }
}

impl TryFrom<String> for StepType {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        StepType::from_str(&s)
    }
}

/// A single step in a funnel.
///
/// `data` is the opaque per-module payload carried by the editor. The
/// analyzer only probes it for well-known keys and treats anything
/// malformed as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelNode {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub data: HashMap<String, Value>,
}

impl FunnelNode {
    pub fn new(id: impl Into<String>, step_type: StepType) -> Self {
        Self {
            id: id.into(),
            step_type,
            data: HashMap::new(),
        }
    }
}

/// A directed transition between two steps.
///
/// Endpoints reference node ids but may dangle; multiple edges between
/// the same pair are allowed and counted individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelEdge {
    pub source: String,
    pub target: String,
}

impl FunnelEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A marketing funnel as a directed graph of steps and transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelGraph {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<FunnelNode>,
    #[serde(default)]
    pub edges: Vec<FunnelEdge>,
}

impl FunnelGraph {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Distinct step types present, in first-appearance order.
    pub fn distinct_step_types(&self) -> Vec<StepType> {
        let mut seen = Vec::new();
        for node in &self.nodes {
            if !seen.contains(&node.step_type) {
                seen.push(node.step_type.clone());
            }
        }
        seen
    }
}
