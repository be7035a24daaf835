//! Integration tests for the commands config document ([`apibot::load_config`], [`apibot::parse_config`]).
//!
//! Covers: a valid document in order, non-YAML input, empty documents, collected field errors,
//! duplicate names, and missing files.

use std::io::Write;
use std::path::{Path, PathBuf};

use apibot::{load_config, parse_config, ConfigError};

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

/// **Test: Valid document loads every binding in order.**
///
/// **Setup:** `testdata/valid.yaml` with joke, fact, qotd.
/// **Action:** `load_config`.
/// **Expected:** Three bindings, names and URLs as written, template text preserved.
#[test]
fn test_load_valid_config() {
    let config = load_config(&testdata("valid.yaml")).unwrap();

    let names: Vec<_> = config.commands.iter().map(|c| c.command_name.as_str()).collect();
    assert_eq!(names, ["joke", "fact", "qotd"]);
    assert_eq!(
        config.commands[1].api_url,
        "https://uselessfacts.jsph.pl/random.json?language=en"
    );
    assert!(config.commands[0].template.contains("{{ .delivery }}"));
    assert_eq!(config.commands[2].template, "{{ .quote.body }} - {{ .quote.author }}");
}

/// **Test: Non-YAML input is a parse error, not a validation error.**
#[test]
fn test_load_not_yaml() {
    let err = load_config(&testdata("not-yaml.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)), "got {err:?}");
}

/// **Test: Empty file and empty document both fail with "Commands: cannot be blank".**
#[test]
fn test_load_empty_documents() {
    for name in ["empty.yaml", "empty-document.yaml"] {
        let err = load_config(&testdata(name)).unwrap_err();
        assert_eq!(err.to_string(), "Commands: cannot be blank", "file {name}");
    }
    assert_eq!(
        parse_config("commands: []").unwrap_err().to_string(),
        "Commands: cannot be blank"
    );
    assert_eq!(
        parse_config("commands:\n").unwrap_err().to_string(),
        "Commands: cannot be blank"
    );
}

/// **Test: Every invalid field is reported with its index.**
///
/// **Setup:** `testdata/missing-fields.yaml`: entry 0 lacks url and template, entry 1 lacks
/// command and has a bad url, entry 2 has a non-alphanumeric name and an unclosed `if`.
/// **Action:** `load_config`.
/// **Expected:** Six field errors, in entry order.
#[test]
fn test_load_missing_fields_collects_all() {
    let err = load_config(&testdata("missing-fields.yaml")).unwrap_err();
    let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(
        fields,
        [
            "Commands[0].ApiUrl",
            "Commands[0].Template",
            "Commands[1].Command",
            "Commands[1].ApiUrl",
            "Commands[2].Command",
            "Commands[2].Template",
        ]
    );
    let message = err.to_string();
    assert!(message.contains("Commands[0].ApiUrl: cannot be blank"));
    assert!(message.contains("Commands[1].ApiUrl: must be a valid URL"));
    assert!(message.contains("Commands[2].Command: must contain English letters and digits only"));
}

#[test]
fn test_duplicate_command_rejected() {
    let yaml = r#"
commands:
  - command: joke
    apiUrl: http://a.example/
    template: "{{ .a }}"
  - command: joke
    apiUrl: http://b.example/
    template: "{{ .b }}"
"#;
    let err = parse_config(yaml).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Commands[1].Command: duplicate command \"joke\""
    );
}

#[test]
fn test_blank_strings_are_missing() {
    let yaml = "commands:\n  - command: \"  \"\n    apiUrl: http://a.example/\n    template: \"\"\n";
    let err = parse_config(yaml).unwrap_err();
    let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["Commands[0].Command", "Commands[0].Template"]);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.yaml");
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("nope.yaml"));
}

#[test]
fn test_load_from_temp_file_with_bom() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "\u{feff}commands:\n  - command: Fact1\n    apiUrl: https://example.com/fact\n    template: \"{{{{ .text }}}}\"\n"
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.commands.len(), 1);
    assert_eq!(config.commands[0].command_name, "Fact1");
    assert_eq!(config.commands[0].template, "{{ .text }}");
}

/// **Test: The shipped `config.yaml` is valid.**
#[test]
fn test_repository_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config.yaml");
    let config = load_config(&path).unwrap();
    assert_eq!(config.commands[0].command_name, "joke");
    assert!(config.commands.iter().all(|c| !c.template.is_empty()));
}
