use linkfinder::{Extractor, FILENAME_EXTENSIONS, Rule};

#[test]
fn test_relative_path_in_fetch_call() {
    let found = Extractor::default().extract(r#"fetch("/api/v1/users").then(r => r.json())"#);
    assert_eq!(found, vec![r#""/api/v1/users""#]);
}

#[test]
fn test_matches_in_order_of_appearance() {
    let text = r#"
        const a = "https://api.example.com/v2/items";
        const b = '/static/logo.png';
        const c = "config.json";
    "#;

    let found = Extractor::default().extract(text);

    assert_eq!(
        found,
        vec![
            r#""https://api.example.com/v2/items""#,
            "'/static/logo.png'",
            r#""config.json""#,
        ]
    );
}

#[test]
fn test_adjacent_strings_do_not_overlap() {
    let found = Extractor::default().extract(r#"["/a/one.js","/a/two.js"]"#);
    assert_eq!(found, vec![r#""/a/one.js""#, r#""/a/two.js""#]);
}

#[test]
fn test_unquoted_text_is_ignored() {
    let found = Extractor::default().extract("see /api/v1/users and https://example.com/x");
    assert!(found.is_empty());
}

#[test]
fn test_plain_words_are_ignored() {
    let found = Extractor::default().extract(r#"var s = "hello world"; var t = 'abc';"#);
    assert!(found.is_empty());
}

#[test]
fn test_unknown_extension_without_slash_is_ignored() {
    let found = Extractor::default().extract(r#"download("setup.exe")"#);
    assert!(found.is_empty());
}

#[test]
fn test_extraction_is_deterministic() {
    let text = r#"
        import x from "./lib/util.js";
        fetch('/api/login', { method: "POST" });
        location = "//cdn.example.net/app/main.js";
    "#;
    let extractor = Extractor::default();

    assert_eq!(extractor.extract(text), extractor.extract(text));
    assert_eq!(
        Extractor::shared().extract(text),
        Extractor::default().extract(text)
    );
}

#[test]
fn test_rules_are_reported() {
    let text = r#"
        "https://api.example.com/v1"
        "../admin/panel"
        "static/js/app.js"
        "api/users/list"
        "login.php?next=1"
    "#;

    let rules: Vec<Option<Rule>> = Extractor::default()
        .extract_with_rules(text)
        .into_iter()
        .map(|m| m.rule)
        .collect();

    assert_eq!(
        rules,
        vec![
            Some(Rule::AbsoluteUrl),
            Some(Rule::RelativePath),
            Some(Rule::FilePath),
            Some(Rule::DeepPath),
            Some(Rule::Filename),
        ]
    );
}

#[test]
fn test_extract_with_rules_agrees_with_extract() {
    let text = r#"a("/x/y") b('//cdn.io/z.js') c("index.html")"#;
    let extractor = Extractor::default();

    let values: Vec<String> = extractor
        .extract_with_rules(text)
        .into_iter()
        .map(|m| m.value)
        .collect();

    assert_eq!(values, extractor.extract(text));
}

#[test]
fn test_custom_pattern_has_no_rule() {
    let extractor = Extractor::with_pattern(r#""/api/[a-z]+""#).unwrap();
    let found = extractor.extract_with_rules(r#"x = "/api/users""#);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value, r#""/api/users""#);
    assert_eq!(found[0].rule, None);
}

#[test]
fn test_invalid_custom_pattern_rejected() {
    assert!(Extractor::with_pattern("(unclosed").is_err());
}

#[cfg(test)]
mod rule_tests {
    use super::*;

    #[test]
    fn test_absolute_url_rule() {
        let extractor = Extractor::for_rule(Rule::AbsoluteUrl);

        assert_eq!(
            extractor.extract(r#"u = "https://cdn.example.com/lib.js""#),
            vec![r#""https://cdn.example.com/lib.js""#]
        );
        assert_eq!(
            extractor.extract("u = '//cdn.example.com/x.js'"),
            vec!["'//cdn.example.com/x.js'"]
        );
        assert!(extractor.extract(r#""https://localhost""#).is_empty());
    }

    #[test]
    fn test_relative_path_rule() {
        let extractor = Extractor::for_rule(Rule::RelativePath);

        assert_eq!(extractor.extract(r#""/api/v1""#), vec![r#""/api/v1""#]);
        assert_eq!(extractor.extract(r#""./util.js""#), vec![r#""./util.js""#]);
        assert_eq!(
            extractor.extract(r#""../up/one""#),
            vec![r#""../up/one""#]
        );
        // A path segment cannot start with a space or a second slash
        assert!(extractor.extract(r#""/ spaced""#).is_empty());
        assert!(extractor.extract(r#""//double""#).is_empty());
    }

    #[test]
    fn test_file_path_rule() {
        let extractor = Extractor::for_rule(Rule::FilePath);

        assert_eq!(
            extractor.extract(r#""static/js/app.js""#),
            vec![r#""static/js/app.js""#]
        );
        assert_eq!(
            extractor.extract(r#""user/login.action?next=home""#),
            vec![r#""user/login.action?next=home""#]
        );
        assert!(extractor.extract(r#""static/app""#).is_empty());
    }

    #[test]
    fn test_deep_path_rule() {
        let extractor = Extractor::for_rule(Rule::DeepPath);

        assert_eq!(
            extractor.extract(r#""api/users/list""#),
            vec![r#""api/users/list""#]
        );
        assert_eq!(
            extractor.extract(r#""v2/items#top""#),
            vec![r#""v2/items#top""#]
        );
        assert!(extractor.extract(r#""a/bc""#).is_empty());
    }

    #[test]
    fn test_filename_rule_covers_every_extension() {
        let extractor = Extractor::for_rule(Rule::Filename);

        for extension in FILENAME_EXTENSIONS {
            let quoted = format!("\"file.{extension}\"");
            assert_eq!(
                extractor.extract(&quoted),
                vec![quoted.clone()],
                "extension {extension} should match"
            );
        }
    }

    #[test]
    fn test_filename_rule_with_query() {
        let extractor = Extractor::for_rule(Rule::Filename);

        assert_eq!(
            extractor.extract("'search.php?q=1'"),
            vec!["'search.php?q=1'"]
        );
        assert!(extractor.extract(r#""archive.zip""#).is_empty());
    }

    #[test]
    fn test_single_rule_ignores_other_shapes() {
        let extractor = Extractor::for_rule(Rule::Filename);
        let found = extractor.extract(r#""api/v1/users" "x.json""#);
        assert_eq!(found, vec![r#""x.json""#]);
    }
}
