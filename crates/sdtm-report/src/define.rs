//! Define.xml-style variable metadata.

use sdtm_model::{Specification, VariableType};
use serde::{Deserialize, Serialize};

use crate::labels::variable_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableOrigin {
    /// Copied from a collected source field.
    #[serde(rename = "CRF")]
    Crf,
    Derived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefineVariable {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub data_type: VariableType,
    pub codelist: Option<String>,
    pub origin: VariableOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefineMetadata {
    pub study_id: String,
    pub domain: String,
    pub variables: Vec<DefineVariable>,
}

/// A variable with a source field and no derivation text is collected data.
pub fn define_metadata(spec: &Specification) -> DefineMetadata {
    let variables = spec
        .variables
        .iter()
        .map(|variable| {
            let collected = variable.source_variable.is_some()
                && variable.mapping_logic.trim().is_empty();
            DefineVariable {
                name: variable.target_variable.clone(),
                label: variable_label(&variable.target_variable).to_string(),
                data_type: variable.data_type,
                codelist: variable.codelist().map(str::to_string),
                origin: if collected {
                    VariableOrigin::Crf
                } else {
                    VariableOrigin::Derived
                },
            }
        })
        .collect();
    DefineMetadata {
        study_id: spec.study_id.clone(),
        domain: spec.domain.clone(),
        variables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdtm_model::VariableSpec;

    #[test]
    fn metadata_json() {
        let spec = Specification::new(
            "XYZ-2026-001",
            "DM",
            vec![
                VariableSpec::new("SEX", VariableType::Char)
                    .with_source("GENDER")
                    .with_codelist("C66731"),
                VariableSpec::new("AGE", VariableType::Num)
                    .with_logic("floor((RFSTDTC - BRTHDTC) / 365.25)"),
            ],
        );
        insta::assert_json_snapshot!(define_metadata(&spec), @r#"
        {
          "study_id": "XYZ-2026-001",
          "domain": "DM",
          "variables": [
            {
              "name": "SEX",
              "label": "Sex",
              "type": "Char",
              "codelist": "C66731",
              "origin": "CRF"
            },
            {
              "name": "AGE",
              "label": "Age",
              "type": "Num",
              "codelist": null,
              "origin": "Derived"
            }
          ]
        }
        "#);
    }
}
