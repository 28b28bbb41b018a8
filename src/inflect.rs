//! Table name derivation.
//!
//! A record type that does not override its table explicitly gets the
//! lower-cased, pluralized form of its type name: `Account` stores in
//! `accounts`, `Entity` in `entities`, `Class` in `classes`. The rules are
//! deliberately small and deterministic so table names can be asserted
//! without a live store; irregular nouns should override the table on their
//! schema instead.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // sibilant endings take -es: class, dish, match, box, quiz
    static ref SIBILANT_ENDING: Regex = Regex::new(r"(s|sh|ch|x|z)$").unwrap();
    // consonant + y turns into -ies: entity, registry
    static ref CONSONANT_Y_ENDING: Regex = Regex::new(r"[^aeiou]y$").unwrap();
}

/// The conventional table name for a type name.
pub fn table_name(type_name: &str) -> String {
    pluralize(&type_name.to_lowercase())
}

/// Pluralizes an already lower-cased noun.
pub fn pluralize(noun: &str) -> String {
    if CONSONANT_Y_ENDING.is_match(noun) {
        format!("{}ies", &noun[..noun.len() - 1])
    } else if SIBILANT_ENDING.is_match(noun) {
        format!("{}es", noun)
    } else {
        format!("{}s", noun)
    }
}
