//! Structured reading of `mapping_logic`.
//!
//! Generators never interpret free text themselves. Each variable is first
//! resolved to a [`Derivation`]; both generators then render the same plan in
//! their own style.
//!
//! Accepted forms:
//!
//! | Logic | Meaning |
//! |---|---|
//! | *(empty)* | copy `source_variable` |
//! | `SUBJID` | copy the named column |
//! | `"DM"` | constant |
//! | `STUDYID \|\| "-" \|\| SUBJID` | concatenation of columns and literals |
//! | `iso_date(BRTHDT)` | normalize a date to `YYYY-MM-DD` |
//! | `age_years(BRTHDTC, RFSTDTC)` | completed years between two dates |
//! | `study_day(DMDTC, RFSTDTC)` | SDTM study day (no day zero) |
//! | `missing` | always null |

use sdtm_model::{Specification, VariableSpec};

use crate::error::GenerateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Literal(String),
    Column(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    Copy(String),
    Constant(String),
    Concat(Vec<Term>),
    IsoDate(String),
    AgeYears { birth: String, reference: String },
    StudyDay { date: String, reference: String },
    Missing,
}

impl Derivation {
    /// Columns this derivation reads.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Derivation::Copy(column) | Derivation::IsoDate(column) => vec![column.as_str()],
            Derivation::Concat(terms) => terms
                .iter()
                .filter_map(|term| match term {
                    Term::Column(column) => Some(column.as_str()),
                    Term::Literal(_) => None,
                })
                .collect(),
            Derivation::AgeYears { birth, reference } => vec![birth.as_str(), reference.as_str()],
            Derivation::StudyDay { date, reference } => vec![date.as_str(), reference.as_str()],
            Derivation::Constant(_) | Derivation::Missing => Vec::new(),
        }
    }
}

/// A specification variable paired with its resolved derivation.
#[derive(Debug, Clone)]
pub struct PlannedVariable<'a> {
    pub variable: &'a VariableSpec,
    pub derivation: Derivation,
}

impl PlannedVariable<'_> {
    pub fn name(&self) -> &str {
        &self.variable.target_variable
    }
}

/// Resolves every variable of `spec`, in specification order.
pub fn plan(spec: &Specification) -> Result<Vec<PlannedVariable<'_>>, GenerateError> {
    if spec.variables.is_empty() {
        return Err(GenerateError::EmptySpecification {
            domain: spec.domain.clone(),
        });
    }
    spec.variables
        .iter()
        .map(|variable| {
            Ok(PlannedVariable {
                variable,
                derivation: parse_logic(variable)?,
            })
        })
        .collect()
}

/// Orders `planned` so every variable comes after the targets it reads.
///
/// Among variables that are ready, the lowest index is taken first, or the
/// highest when `prefer_last` is set. A variable reading its own name reads
/// the raw column and does not depend on itself.
pub fn dependency_order(
    planned: &[PlannedVariable<'_>],
    prefer_last: bool,
) -> Result<Vec<usize>, GenerateError> {
    let position = |name: &str| {
        planned
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(name))
    };
    let dependencies: Vec<Vec<usize>> = planned
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let mut deps: Vec<usize> = p
                .derivation
                .inputs()
                .into_iter()
                .filter_map(position)
                .filter(|&dep| dep != idx)
                .collect();
            deps.sort_unstable();
            deps.dedup();
            deps
        })
        .collect();

    let mut placed = vec![false; planned.len()];
    let mut order = Vec::with_capacity(planned.len());
    while order.len() < planned.len() {
        let mut ready = (0..planned.len())
            .filter(|&idx| !placed[idx] && dependencies[idx].iter().all(|&dep| placed[dep]));
        let next = if prefer_last { ready.last() } else { ready.next() };
        match next {
            Some(idx) => {
                placed[idx] = true;
                order.push(idx);
            }
            None => {
                let variables = (0..planned.len())
                    .filter(|&idx| !placed[idx])
                    .map(|idx| planned[idx].name())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(GenerateError::DerivationCycle { variables });
            }
        }
    }
    Ok(order)
}

fn parse_logic(variable: &VariableSpec) -> Result<Derivation, GenerateError> {
    let logic = variable.mapping_logic.trim();
    let unsupported = || GenerateError::UnsupportedLogic {
        variable: variable.target_variable.clone(),
        logic: logic.to_string(),
    };

    if logic.is_empty() {
        return variable
            .source_variable
            .as_deref()
            .map(str::trim)
            .filter(|source| is_identifier(source))
            .map(|source| Derivation::Copy(source.to_string()))
            .ok_or_else(|| GenerateError::NoDerivation {
                variable: variable.target_variable.clone(),
            });
    }
    if logic.eq_ignore_ascii_case("missing") {
        return Ok(Derivation::Missing);
    }
    if logic.contains("||") {
        let terms = logic
            .split("||")
            .map(|part| parse_term(part.trim()).ok_or_else(unsupported))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Derivation::Concat(terms));
    }
    if let Some(literal) = unquote(logic) {
        return Ok(Derivation::Constant(literal.to_string()));
    }
    if is_identifier(logic) {
        return Ok(Derivation::Copy(logic.to_string()));
    }

    let (function, args) = parse_call(logic).ok_or_else(unsupported)?;
    match (function.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("copy", [column]) => Ok(Derivation::Copy(column.clone())),
        ("iso_date", [column]) => Ok(Derivation::IsoDate(column.clone())),
        ("age_years", [birth, reference]) => Ok(Derivation::AgeYears {
            birth: birth.clone(),
            reference: reference.clone(),
        }),
        ("study_day", [date, reference]) => Ok(Derivation::StudyDay {
            date: date.clone(),
            reference: reference.clone(),
        }),
        _ => Err(unsupported()),
    }
}

fn parse_term(part: &str) -> Option<Term> {
    if let Some(literal) = unquote(part) {
        return Some(Term::Literal(literal.to_string()));
    }
    is_identifier(part).then(|| Term::Column(part.to_string()))
}

/// `name(arg, arg)` with identifier arguments.
fn parse_call(logic: &str) -> Option<(&str, Vec<String>)> {
    let open = logic.find('(')?;
    let inner = logic.strip_suffix(')')?.get(open + 1..)?;
    let function = logic[..open].trim();
    if !is_identifier(function) {
        return None;
    }
    let args: Vec<String> = inner.split(',').map(|arg| arg.trim().to_string()).collect();
    args.iter()
        .all(|arg| is_identifier(arg))
        .then_some((function, args))
}

fn unquote(text: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
        (!inner.contains(quote)).then_some(inner)
    })
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
