//! Exports Tests
//!
//! Key conventions, the `:export` rule and the JSON callback.

mod utils;
use css_modules::exports::structured;
use css_modules::{AbsoluteFsPath, ExportMap, LocalsConvention, Options};
use std::sync::{Arc, Mutex};
use utils::{run, run_single, suffix_options};

fn with_convention(convention: LocalsConvention) -> Options {
    Options {
        locals_convention: convention,
        ..suffix_options()
    }
}

#[test]
fn should_add_camel_case_aliases() {
    let result = run_single(
        with_convention(LocalsConvention::CamelCase),
        ".btn-primary { composes: base } .base {}",
    )
    .unwrap();
    let keys: Vec<&str> = result.exports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["btn-primary", "btnPrimary", "base"]);
    assert_eq!(result.exports["btnPrimary"], "btn-primary_x base_x");
}

#[test]
fn should_only_export_converted_keys() {
    let result = run_single(
        with_convention(LocalsConvention::CamelCaseOnly),
        ".btn-primary {} .nav_item {}",
    )
    .unwrap();
    let keys: Vec<&str> = result.exports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["btnPrimary", "navItem"]);
}

#[test]
fn should_only_convert_dashes_in_dashes_mode() {
    let result = run_single(
        with_convention(LocalsConvention::Dashes),
        ".btn-primary {} .nav_item {}",
    )
    .unwrap();
    let keys: Vec<&str> = result.exports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["btn-primary", "btnPrimary", "nav_item"]);
}

#[test]
fn should_never_overwrite_canonical_keys_with_aliases() {
    let result = run_single(
        with_convention(LocalsConvention::CamelCase),
        ".fooBar {} .foo-bar {}",
    )
    .unwrap();
    assert_eq!(result.exports["fooBar"], "fooBar_x");
    assert_eq!(result.exports["foo-bar"], "foo-bar_x");
}

#[test]
fn should_leave_the_token_table_untouched_by_conventions() {
    let result = run_single(
        with_convention(LocalsConvention::CamelCaseOnly),
        ".btn-primary {}",
    )
    .unwrap();
    assert!(result.tokens.get("btn-primary").is_some());
    assert!(result.tokens.get("btnPrimary").is_none());
}

#[test]
fn should_emit_an_export_rule() {
    let options = Options {
        emit_export_rule: true,
        ..suffix_options()
    };
    let result = run_single(options, ".a { color: red }").unwrap();
    assert_eq!(result.css, ":export{a:a_x}.a_x{color:red}");
}

#[test]
fn should_hand_exports_to_the_json_callback() {
    let seen: Arc<Mutex<Vec<(String, ExportMap)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let options = Options {
        get_json: Some(Arc::new(move |path: &AbsoluteFsPath, exports: &ExportMap| {
            sink.lock()
                .unwrap()
                .push((path.to_string(), exports.clone()));
        })),
        ..suffix_options()
    };
    let files = [
        ("/a.css", r#".a { composes: b from "./b.css" }"#),
        ("/b.css", ".b {}"),
    ];
    run(options, &files, "/a.css").unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "/a.css");
    assert_eq!(seen[0].1["a"], "a_x b_x");
}

#[test]
fn should_build_structured_exports() {
    let result = run_single(suffix_options(), ".a { composes: b c } .b {} .c {}").unwrap();
    let structured = structured(&result.tokens);
    assert_eq!(structured["a"].name, "a_x");
    assert_eq!(structured["a"].composes, vec!["b_x", "c_x"]);
    assert!(structured["b"].composes.is_empty());
}

#[test]
fn should_serialize_results_as_json() {
    let result = run_single(suffix_options(), ".a {}").unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["path"], "/a.css");
    assert_eq!(json["exports"]["a"], "a_x");
    assert_eq!(json["css"], ".a_x{}");
    assert!(json.get("tokens").is_none());
}
