//! Country synonym table.
//!
//! Append-only: every entry maps one normalized spelling (lower-case, single
//! spaces, no trailing full stop) to its canonical country. Extending coverage
//! means adding rows here.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::Country;

const AF: Country = Country::new("Afghanistan", "AF");
const AM: Country = Country::new("Armenia", "AM");
const AZ: Country = Country::new("Azerbaijan", "AZ");
const BO: Country = Country::new("Bolivia", "BO");
const BY: Country = Country::new("Belarus", "BY");
const CN: Country = Country::new("China", "CN");
const CU: Country = Country::new("Cuba", "CU");
const GB: Country = Country::new("United Kingdom", "GB");
const GE: Country = Country::new("Georgia", "GE");
const IQ: Country = Country::new("Iraq", "IQ");
const IR: Country = Country::new("Iran", "IR");
const KG: Country = Country::new("Kyrgyzstan", "KG");
const KP: Country = Country::new("North Korea", "KP");
const KZ: Country = Country::new("Kazakhstan", "KZ");
const LB: Country = Country::new("Lebanon", "LB");
const LY: Country = Country::new("Libya", "LY");
const MD: Country = Country::new("Moldova", "MD");
const ML: Country = Country::new("Mali", "ML");
const MM: Country = Country::new("Myanmar", "MM");
const NI: Country = Country::new("Nicaragua", "NI");
const RS: Country = Country::new("Serbia", "RS");
const RU: Country = Country::new("Russia", "RU");
const SD: Country = Country::new("Sudan", "SD");
const SO: Country = Country::new("Somalia", "SO");
const SY: Country = Country::new("Syria", "SY");
const TJ: Country = Country::new("Tajikistan", "TJ");
const TM: Country = Country::new("Turkmenistan", "TM");
const TR: Country = Country::new("Turkey", "TR");
const UA: Country = Country::new("Ukraine", "UA");
const US: Country = Country::new("United States", "US");
const UZ: Country = Country::new("Uzbekistan", "UZ");
const VE: Country = Country::new("Venezuela", "VE");
const YE: Country = Country::new("Yemen", "YE");
const ZW: Country = Country::new("Zimbabwe", "ZW");

/// `(normalized synonym, canonical country)` rows.
pub(super) const SYNONYMS: &[(&str, Country)] = &[
    // Russia
    ("russia", RU),
    ("russian federation", RU),
    ("russian", RU),
    ("the russian federation", RU),
    ("ussr", RU),
    // China
    ("china", CN),
    ("people's republic of china", CN),
    ("prc", CN),
    ("chinese", CN),
    // Iran
    ("iran", IR),
    ("islamic republic of iran", IR),
    ("iranian", IR),
    // North Korea
    ("north korea", KP),
    ("democratic people's republic of korea", KP),
    ("dprk", KP),
    ("north korean", KP),
    // United Kingdom
    ("united kingdom", GB),
    ("uk", GB),
    ("great britain", GB),
    ("britain", GB),
    ("british", GB),
    ("england", GB),
    // United States
    ("united states", US),
    ("usa", US),
    ("us", US),
    ("america", US),
    ("united states of america", US),
    ("american", US),
    // Ukraine
    ("ukraine", UA),
    ("ukrainian", UA),
    // Kyrgyzstan
    ("kyrgyzstan", KG),
    ("kyrgyz republic", KG),
    ("kyrgyz", KG),
    // Kazakhstan
    ("kazakhstan", KZ),
    ("republic of kazakhstan", KZ),
    ("kazakh", KZ),
    // Belarus
    ("belarus", BY),
    ("republic of belarus", BY),
    ("belarusian", BY),
    // Syria
    ("syria", SY),
    ("syrian arab republic", SY),
    ("syrian", SY),
    // Myanmar
    ("myanmar", MM),
    ("burma", MM),
    // Venezuela
    ("venezuela", VE),
    ("venezuelan", VE),
    // Bolivia
    ("bolivia", BO),
    // Nicaragua
    ("nicaragua", NI),
    // Libya
    ("libya", LY),
    ("libyan", LY),
    // Mali
    ("mali", ML),
    // Zimbabwe
    ("zimbabwe", ZW),
    // Serbia
    ("serbia", RS),
    // Turkey
    ("turkey", TR),
    ("turkiye", TR),
    ("türkiye", TR),
    // Afghanistan
    ("afghanistan", AF),
    ("afghan", AF),
    // Lebanon
    ("lebanon", LB),
    ("lebanese", LB),
    // Iraq
    ("iraq", IQ),
    ("iraqi", IQ),
    // Somalia
    ("somalia", SO),
    // Sudan
    ("sudan", SD),
    // Yemen
    ("yemen", YE),
    // Cuba
    ("cuba", CU),
    // Moldova
    ("moldova", MD),
    ("republic of moldova", MD),
    // Georgia
    ("georgia", GE),
    // Armenia
    ("armenia", AM),
    // Azerbaijan
    ("azerbaijan", AZ),
    // Uzbekistan
    ("uzbekistan", UZ),
    // Tajikistan
    ("tajikistan", TJ),
    // Turkmenistan
    ("turkmenistan", TM),
];

static INDEX: LazyLock<HashMap<&'static str, Country>> =
    LazyLock::new(|| SYNONYMS.iter().copied().collect());

/// Exact lookup of an already-normalized synonym.
pub(super) fn lookup(normalized: &str) -> Option<Country> {
    INDEX.get(normalized).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn synonyms_are_unique() {
        let mut seen = HashSet::new();
        for (synonym, _) in SYNONYMS {
            assert!(seen.insert(*synonym), "duplicate synonym '{synonym}'");
        }
    }

    #[test]
    fn synonyms_are_normalized() {
        for (synonym, _) in SYNONYMS {
            assert_eq!(
                super::super::normalize_text(synonym),
                *synonym,
                "synonym '{synonym}' is not in normalized form"
            );
        }
    }

    #[test]
    fn every_canonical_name_resolves_to_itself() {
        for (_, country) in SYNONYMS {
            let key = country.name.to_lowercase();
            assert_eq!(lookup(&key), Some(*country), "'{}' missing", country.name);
        }
    }

    #[test]
    fn loader_country_spellings_all_resolve() {
        let expected = [
            ("russia", "RU"),
            ("russian federation", "RU"),
            ("russian", "RU"),
            ("china", "CN"),
            ("people's republic of china", "CN"),
            ("chinese", "CN"),
            ("iran", "IR"),
            ("islamic republic of iran", "IR"),
            ("iranian", "IR"),
            ("north korea", "KP"),
            ("democratic people's republic of korea", "KP"),
            ("dprk", "KP"),
            ("united kingdom", "GB"),
            ("uk", "GB"),
            ("great britain", "GB"),
            ("britain", "GB"),
            ("united states", "US"),
            ("united states of america", "US"),
            ("usa", "US"),
            ("america", "US"),
            ("ukraine", "UA"),
            ("kyrgyzstan", "KG"),
            ("kyrgyz republic", "KG"),
            ("kazakhstan", "KZ"),
            ("republic of kazakhstan", "KZ"),
            ("belarus", "BY"),
            ("republic of belarus", "BY"),
            ("syria", "SY"),
            ("syrian arab republic", "SY"),
            ("myanmar", "MM"),
            ("burma", "MM"),
            ("venezuela", "VE"),
            ("bolivia", "BO"),
            ("nicaragua", "NI"),
            ("libya", "LY"),
            ("mali", "ML"),
            ("zimbabwe", "ZW"),
            ("serbia", "RS"),
            ("turkey", "TR"),
            ("turkiye", "TR"),
            ("afghanistan", "AF"),
            ("lebanon", "LB"),
            ("iraq", "IQ"),
            ("somalia", "SO"),
            ("sudan", "SD"),
            ("yemen", "YE"),
            ("cuba", "CU"),
            ("moldova", "MD"),
            ("georgia", "GE"),
            ("armenia", "AM"),
            ("azerbaijan", "AZ"),
            ("uzbekistan", "UZ"),
            ("tajikistan", "TJ"),
            ("turkmenistan", "TM"),
        ];
        for (spelling, code) in expected {
            assert_eq!(lookup(spelling).map(|c| c.code), Some(code), "'{spelling}'");
        }
    }

    #[test]
    fn codes_are_two_upper_case_letters() {
        for (_, country) in SYNONYMS {
            assert_eq!(country.code.len(), 2);
            assert!(country.code.chars().all(|c| c.is_ascii_uppercase()));
        }
    }
}
