use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    automaton::{
        Automaton, StateIndex,
        dfa::pair::{EquivalentPairs, StatePair},
    },
    batch::{BatchReport, CaseResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One line of `(a, b)` pairs per test case.
    #[default]
    Text,
    /// A pretty-printed JSON array with one object per test case.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Renders the pairs of one test case as a single line without line break,
/// e.g. `(0, 1) (0, 2)`. No pairs render as an empty string.
pub fn format_pairs(pairs: &EquivalentPairs) -> String {
    pairs.to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct SerializableWitness<'a> {
    pub pair: StatePair,
    pub word: Vec<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SerializableCaseResult<'a> {
    pub case: usize,
    pub state_count: usize,
    pub alphabet: &'a [String],
    pub equivalent_pairs: &'a [StatePair],
    pub classes: Vec<Vec<StateIndex>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witnesses: Option<Vec<SerializableWitness<'a>>>,
}

impl<'a> SerializableCaseResult<'a> {
    /// Witnesses are only included when the table recorded them.
    pub fn new(result: &'a CaseResult) -> Self {
        let witnesses = result.table.has_witnesses().then(|| {
            result
                .witnesses()
                .into_iter()
                .map(|(pair, word)| SerializableWitness {
                    pair,
                    word: result.dfa.word_to_names(&word),
                })
                .collect()
        });

        SerializableCaseResult {
            case: result.case,
            state_count: result.dfa.state_count(),
            alphabet: result.dfa.alphabet(),
            equivalent_pairs: result.pairs.pairs(),
            classes: result.pairs.classes(),
            witnesses,
        }
    }
}

pub fn render_text(report: &BatchReport) -> String {
    let mut out = String::new();
    for result in &report.cases {
        out.push_str(&format_pairs(&result.pairs));
        out.push('\n');
    }
    out
}

pub fn render_json(report: &BatchReport) -> anyhow::Result<String> {
    let results = report
        .cases
        .iter()
        .map(SerializableCaseResult::new)
        .collect::<Vec<_>>();

    Ok(serde_json::to_string_pretty(&results)?)
}

/// Renders every computed test case. A trailing error in the report is not
/// part of the output.
pub fn render(report: &BatchReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => {
            let mut json = render_json(report)?;
            json.push('\n');
            Ok(json)
        }
    }
}
