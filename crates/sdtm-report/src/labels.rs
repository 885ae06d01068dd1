//! Standard SDTM variable labels.

const LABELS: &[(&str, &str)] = &[
    ("STUDYID", "Study Identifier"),
    ("DOMAIN", "Domain Abbreviation"),
    ("USUBJID", "Unique Subject Identifier"),
    ("SUBJID", "Subject Identifier for the Study"),
    ("RFSTDTC", "Subject Reference Start Date/Time"),
    ("RFENDTC", "Subject Reference End Date/Time"),
    ("RFXSTDTC", "Date/Time of First Study Treatment"),
    ("RFXENDTC", "Date/Time of Last Study Treatment"),
    ("RFICDTC", "Date/Time of Informed Consent"),
    ("RFPENDTC", "Date/Time of End of Participation"),
    ("DTHDTC", "Date/Time of Death"),
    ("DTHFL", "Subject Death Flag"),
    ("SITEID", "Study Site Identifier"),
    ("INVID", "Investigator Identifier"),
    ("INVNAM", "Investigator Name"),
    ("BRTHDTC", "Date/Time of Birth"),
    ("AGE", "Age"),
    ("AGEU", "Age Units"),
    ("SEX", "Sex"),
    ("RACE", "Race"),
    ("ETHNIC", "Ethnicity"),
    ("ARMCD", "Planned Arm Code"),
    ("ARM", "Description of Planned Arm"),
    ("ACTARMCD", "Actual Arm Code"),
    ("ACTARM", "Description of Actual Arm"),
    ("COUNTRY", "Country"),
    ("DMDTC", "Date/Time of Collection"),
    ("DMDY", "Study Day of Collection"),
];

/// Label for a variable; unknown names label themselves.
pub fn variable_label(name: &str) -> &str {
    LABELS
        .iter()
        .find(|(variable, _)| variable.eq_ignore_ascii_case(name))
        .map_or(name, |(_, label)| *label)
}
