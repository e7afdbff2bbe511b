//! Mode Gate Tests
//!
//! Local/global switching, pure mode and global module paths.

mod utils;
use css_modules::{ErrorKind, Options, ScopeBehaviour, TokenFlags};
use regex::Regex;
use utils::{run, run_single, suffix_options};

fn with_behaviour(behaviour: ScopeBehaviour) -> Options {
    Options {
        scope_behaviour: behaviour,
        ..suffix_options()
    }
}

#[test]
fn should_pass_global_names_through_untouched() {
    let result = run_single(suffix_options(), ":global(.foo) .a { color: red }").unwrap();
    assert_eq!(result.css, ".foo .a_x{color:red}");
    assert!(result.tokens.get("a").is_some());
    assert!(result.tokens.get("foo").is_none());
}

#[test]
fn should_scope_escaped_class_names_as_one_name() {
    let result = run_single(suffix_options(), r".\31 x { color: red } .sm\:flex {}").unwrap();
    assert_eq!(result.css, r".\31 x_x{color:red}.sm\:flex_x{}");
    assert_eq!(
        utils::export_pairs(&result),
        utils::pairs(&[("1x", "1x_x"), ("sm:flex", "sm:flex_x")])
    );
}

#[test]
fn should_export_globals_when_asked() {
    let options = Options {
        export_globals: true,
        ..suffix_options()
    };
    let result = run_single(options, ":global(.foo) .a {}").unwrap();
    assert_eq!(result.exports["foo"], "foo");
    assert!(result
        .tokens
        .get("foo")
        .unwrap()
        .flags()
        .contains(TokenFlags::GLOBAL));
}

#[test]
fn should_switch_modes_with_bare_pseudos() {
    let result = run_single(suffix_options(), ".a :global .b .c :local .d {}").unwrap();
    assert_eq!(result.css, ".a_x .b .c .d_x{}");
}

#[test]
fn should_reset_bare_switches_at_each_selector() {
    let result = run_single(suffix_options(), ":global .a, .b {}").unwrap();
    assert_eq!(result.css, ".a,.b_x{}");
}

#[test]
fn should_scope_ids_like_classes() {
    let result = run_single(suffix_options(), "#main .a {}").unwrap();
    assert_eq!(result.css, "#main_x .a_x{}");
    assert_eq!(result.exports["main"], "main_x");
}

#[test]
fn should_unwrap_block_wrappers() {
    let result = run_single(
        suffix_options(),
        ":global { .a { color: red } } :local { .b {} }",
    )
    .unwrap();
    assert_eq!(result.css, ".a{color:red}.b_x{}");
}

#[test]
fn should_scope_only_local_wrappers_in_global_files() {
    let result = run_single(
        with_behaviour(ScopeBehaviour::Global),
        ".a {} :local(.b) {} :local { .c {} }",
    )
    .unwrap();
    assert_eq!(result.css, ".a{}.b_x{}.c_x{}");
    let keys: Vec<&str> = result.exports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["b", "c"]);
}

#[test]
fn should_treat_matching_paths_as_global() {
    let options = Options {
        global_module_paths: vec![Regex::new(r"/vendor/").unwrap()],
        ..suffix_options()
    };
    let files = [("/vendor/lib.css", ".a { color: red }")];
    let result = run(options, &files, "/vendor/lib.css").unwrap();
    assert_eq!(result.css, ".a{color:red}");
    assert!(result.exports.is_empty());
}

#[test]
fn should_reject_nested_wrappers() {
    for css in [
        ":global(:local(.a)) {}",
        ":local(.a :global(.b)) {}",
        ":global { :local(.a) {} }",
        ":global { :local { .a {} } }",
    ] {
        let err = run_single(suffix_options(), css).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NestedGlobalLocalError, "{}", css);
    }
}

#[test]
fn should_reject_impure_selectors_in_pure_mode() {
    for css in ["div {}", "div, .a {}", ":global(.foo) {}", "[data-x] > span {}"] {
        let err = run_single(with_behaviour(ScopeBehaviour::Pure), css).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PureModeViolation, "{}", css);
    }
}

#[test]
fn should_accept_pure_selectors() {
    let result = run_single(
        with_behaviour(ScopeBehaviour::Pure),
        "div .a {} #b span {} :global(.foo) .c {}",
    )
    .unwrap();
    assert_eq!(result.css, "div .a_x{}#b_x span{}.foo .c_x{}");
}

#[test]
fn should_exempt_nested_global_and_keyframes_rules_from_purity() {
    let css = r#"
        .a { span { color: red } }
        :global { html { margin: 0 } }
        @keyframes spin { from { opacity: 0 } }
        @media (min-width: 1px) { .b {} }
    "#;
    let result = run_single(with_behaviour(ScopeBehaviour::Pure), css).unwrap();
    assert_eq!(
        result.css,
        ".a_x{span{color:red}}html{margin:0}@keyframes spin_x{from{opacity:0}}@media (min-width: 1px){.b_x{}}"
    );
}

#[test]
fn should_not_exempt_impure_rules_inside_at_rules() {
    let err = run_single(
        with_behaviour(ScopeBehaviour::Pure),
        "@media print { div {} }",
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PureModeViolation);
}
