// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use searchrs::domain::search::bang::{Bang, BangParser};
use std::collections::HashSet;

#[test]
fn test_default_table_codes_are_unique() {
    let defaults = BangParser::default_bangs();
    let codes: HashSet<&str> = defaults.iter().map(|b| b.code.as_str()).collect();
    assert_eq!(codes.len(), defaults.len());
    assert!(defaults.iter().all(|b| !b.code.starts_with('!')));
}

#[test]
fn test_parse_examples() {
    let parser = BangParser::with_defaults();

    let parsed = parser.parse("!ph amateur");
    assert_eq!(parsed.query, "amateur");
    assert_eq!(parsed.engines, vec!["pornhub".to_string()]);
    assert!(parsed.has_bang);

    let parsed = parser.parse("plain query");
    assert_eq!(parsed.query, "plain query");
    assert!(parsed.engines.is_empty());
    assert!(!parsed.has_bang);
}

#[test]
fn test_configured_extras_extend_defaults() {
    let parser = BangParser::with_extra(vec![
        Bang::new("!zz", "zzvideo", "ZZ Video"),
        // 与内置冲突的短码保留内置定义
        Bang::new("ph", "elsewhere", "Elsewhere"),
    ]);

    assert_eq!(parser.list().len(), BangParser::default_bangs().len() + 1);
    assert_eq!(parser.resolve("!ZZ").map(|b| b.engine.as_str()), Some("zzvideo"));
    assert_eq!(parser.resolve("ph").map(|b| b.engine.as_str()), Some("pornhub"));
    assert_eq!(parser.parse("!zz !ph x").engines, vec!["zzvideo", "pornhub"]);
}
