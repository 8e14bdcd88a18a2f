mod fixtures;

use std::io::Write;

use elif_injector::{ErrorKind, InjectorConfig};
use fixtures::*;
use tempfile::NamedTempFile;

const MANIFEST: &str = r#"
aliases:
  fixtures::DepInterface: fixtures::DepImplementation
shares:
  - fixtures::DepInterface
definitions:
  fixtures::InjectorTestChildClass:
    ":arg1": fixtures::TestDependency
    arg2: fixtures::TestDependency2
    "+arg3": fixtures::ExecuteClassInvokable
params:
  thumbnailSize: 64
delegates:
  StdClass: fixtures::StringStdClassDelegateMock
"#;

fn manifest_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn assert_configured(config: &InjectorConfig) {
    let mut injector = injector();
    injector.configure(config).unwrap();

    let first = injector.make(&class("DepInterface")).unwrap();
    let second = injector.make(&class("DepInterface")).unwrap();
    assert!(first.is::<DepImplementation>());
    assert!(first.same(&second));

    let child = injector.make(&class("InjectorTestChildClass")).unwrap();
    let child = child.downcast_ref::<Record>().unwrap();
    assert_eq!(child.arg(0).as_str(), Some("fixtures::TestDependency"));
    assert_eq!(
        child.object(1).downcast_ref::<TestDependency>().unwrap().test_prop,
        "testVal2"
    );
    assert_eq!(child.arg(2).as_i64(), Some(42));

    let dependency = injector
        .make(&class("DependencyWithTypelessParameters"))
        .unwrap();
    assert_eq!(
        dependency.downcast_ref::<Record>().unwrap().arg(0).as_i64(),
        Some(64)
    );

    let std_class = injector.make(STD_CLASS).unwrap();
    assert!(std_class.downcast_ref::<StdClass>().unwrap().get("test").is_some());
}

#[test]
fn test_configure_from_yaml() {
    let config = InjectorConfig::from_yaml_str(MANIFEST).unwrap();
    assert_configured(&config);
}

#[test]
fn test_configure_from_json() {
    let yaml = InjectorConfig::from_yaml_str(MANIFEST).unwrap();
    let config = InjectorConfig::from_json_str(&yaml.to_json().unwrap()).unwrap();
    assert_configured(&config);
}

#[test]
fn test_configured_bindings_match_programmatic_bindings() {
    let config = InjectorConfig::from_yaml_str(MANIFEST).unwrap();
    let mut configured = injector();
    configured.configure(&config).unwrap();

    let mut programmatic = injector();
    programmatic
        .alias(&class("DepInterface"), &class("DepImplementation"))
        .unwrap()
        .share(class("DepInterface"))
        .unwrap()
        .define(
            &class("InjectorTestChildClass"),
            InjectorConfig::definition(&config.definitions[&class("InjectorTestChildClass")])
                .unwrap(),
        )
        .define_param("thumbnailSize", 64)
        .delegate(STD_CLASS, class("StringStdClassDelegateMock"))
        .unwrap();

    assert_eq!(
        configured.inspect().to_string(),
        programmatic.inspect().to_string()
    );
}

#[test]
fn test_load_manifest_files() {
    let yaml = manifest_file(".yaml", MANIFEST);
    let from_yaml = InjectorConfig::from_file(yaml.path()).unwrap();
    assert_eq!(from_yaml, InjectorConfig::from_yaml_str(MANIFEST).unwrap());

    let yml = manifest_file(".YML", MANIFEST);
    assert_eq!(InjectorConfig::from_file(yml.path()).unwrap(), from_yaml);

    let json = manifest_file(".json", &from_yaml.to_json().unwrap());
    assert_eq!(InjectorConfig::from_file(json.path()).unwrap(), from_yaml);
}

#[test]
fn test_unsupported_manifest_extension() {
    let file = manifest_file(".toml", "aliases = {}");
    let error = InjectorConfig::from_file(file.path()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(error.to_string().contains("toml"));
}

#[test]
fn test_missing_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let error = InjectorConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
    assert!(error.to_string().starts_with("IO error"));
}

#[test]
fn test_invalid_manifest_applies_nothing() {
    let config = InjectorConfig::from_yaml_str(
        "aliases:\n  fixtures::DepInterface: fixtures::DepImplementation\nshares:\n  - ''\n",
    )
    .unwrap();

    let mut injector = injector();
    let error = injector.configure(&config).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(!injector.has_alias(&class("DepInterface")));
    assert!(injector.inspect().is_empty());
}

#[test]
fn test_invalid_delegate_in_manifest() {
    let config = InjectorConfig::from_yaml_str(&format!(
        "delegates:\n  {}: {}\n",
        STD_CLASS,
        class("StringDelegateWithNoInvokeMethod")
    ))
    .unwrap();

    let mut injector = injector();
    let error = injector.configure(&config).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidDelegate);
}

#[test]
fn test_rejected_registration_restores_previous_bindings() {
    let config = InjectorConfig::from_yaml_str(&format!(
        "aliases:\n  {}: {}\nshares:\n  - {}\nparams:\n  thumbnailSize: 64\n\
         delegates:\n  {}: {}\n",
        class("DepInterface"),
        class("DepImplementation"),
        class("TestDependency"),
        STD_CLASS,
        class("StringDelegateWithNoInvokeMethod")
    ))
    .unwrap();

    let mut injector = injector();
    injector.define_param("retries", 3);
    let before = injector.inspect();

    let error = injector.configure(&config).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidDelegate);
    assert!(!injector.has_alias(&class("DepInterface")));
    assert!(!injector.is_shared(&class("TestDependency")));
    assert!(!injector.has_delegate(STD_CLASS));
    assert_eq!(injector.inspect(), before);
    assert_eq!(injector.inspect().params, vec!["retries".to_string()]);
}

#[test]
fn test_manifest_round_trips_through_yaml() {
    let config = InjectorConfig::from_yaml_str(MANIFEST).unwrap();
    let reparsed = InjectorConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
    assert_eq!(config, reparsed);
}
