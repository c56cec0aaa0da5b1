//! Municipalities and the postal codes the housing-price table covers
//!
//! Municipality codes follow the Statistics Finland postal-area WFS
//! (`postialue:pno_tilasto_2024`). Only postal codes present in
//! `statfin_ashi_pxt_13mu` are listed.

use chrono::Datelike;

pub struct Municipality {
    pub code: &'static str,
    pub name: &'static str,
    pub postal_codes: &'static [&'static str],
}

pub const MUNICIPALITIES: &[Municipality] = &[
    Municipality {
        code: "091",
        name: "Helsinki",
        postal_codes: &[
            "00100", "00120", "00130", "00140", "00150", "00160", "00170", "00180", "00200",
            "00210", "00220", "00240", "00250", "00260", "00270", "00280", "00290", "00300",
            "00310", "00320", "00330", "00340", "00350", "00360", "00370", "00380", "00390",
            "00400", "00410", "00420", "00430", "00440", "00500", "00510", "00520", "00530",
            "00540", "00550", "00560", "00570", "00580", "00590", "00600", "00610", "00620",
            "00630", "00640", "00650", "00660", "00670", "00680", "00690", "00700", "00710",
            "00720", "00730", "00740", "00750", "00760", "00770", "00780", "00790", "00800",
            "00810", "00820", "00830", "00840", "00850", "00870", "00880", "00890", "00900",
            "00910", "00920", "00930", "00940", "00950", "00960", "00970", "00980", "00990",
        ],
    },
    Municipality {
        code: "049",
        name: "Espoo",
        postal_codes: &[
            "02100", "02110", "02120", "02130", "02140", "02150", "02160", "02170", "02180",
            "02200", "02210", "02230", "02240", "02250", "02260", "02270", "02280", "02300",
            "02320", "02330", "02340", "02360", "02380", "02600", "02610", "02620", "02630",
            "02650", "02660", "02680", "02710", "02720", "02730", "02740", "02750", "02760",
            "02770", "02780", "02810", "02820", "02860", "02920", "02940", "02970",
        ],
    },
    Municipality {
        code: "092",
        name: "Vantaa",
        postal_codes: &[
            "01200", "01230", "01260", "01280", "01300", "01340", "01350", "01360", "01370",
            "01380", "01390", "01400", "01420", "01450", "01480", "01490", "01510", "01520",
            "01530", "01600", "01610", "01620", "01630", "01640", "01650", "01660", "01670",
            "01680", "01690", "01700", "01710", "01720", "01730", "01740", "01750", "01760",
        ],
    },
    Municipality {
        code: "837",
        name: "Tampere",
        postal_codes: &[
            "33100", "33180", "33200", "33210", "33230", "33240", "33250", "33270", "33300",
            "33310", "33330", "33340", "33400", "33410", "33420", "33500", "33520", "33530",
            "33540", "33560", "33580", "33610", "33680", "33700", "33710", "33720", "33730",
            "33800", "33820", "33840", "33850", "33870", "33900", "34240", "34260",
        ],
    },
    Municipality {
        code: "604",
        name: "Pirkkala",
        postal_codes: &["33920", "33950", "33960", "33980"],
    },
    Municipality {
        code: "980",
        name: "Ylöjärvi",
        postal_codes: &[
            "33430", "33450", "33470", "33480", "34110", "34130", "34140", "34300", "39160",
            "39310", "39340",
        ],
    },
    Municipality {
        code: "211",
        name: "Kangasala",
        postal_codes: &[
            "36100", "36110", "36200", "36220", "36240", "36270", "36280", "36420", "36430",
            "36810", "36840",
        ],
    },
    Municipality {
        code: "536",
        name: "Nokia",
        postal_codes: &["37100", "37120", "37130", "37140", "37150", "37200", "37240"],
    },
];

/// First year requested by default
pub const FETCH_START_YEAR: i32 = 2018;

/// Find a municipality by name (case-insensitive) or by code
pub fn municipality(name_or_code: &str) -> Option<&'static Municipality> {
    MUNICIPALITIES
        .iter()
        .find(|m| m.code == name_or_code || m.name.to_lowercase() == name_or_code.to_lowercase())
}

/// Municipality names, sorted
pub fn municipality_names() -> Vec<&'static str> {
    let mut names: Vec<&str> = MUNICIPALITIES.iter().map(|m| m.name).collect();
    names.sort_unstable();
    names
}

/// Every listed postal code, sorted
pub fn all_postal_codes() -> Vec<String> {
    let mut codes: Vec<String> = MUNICIPALITIES
        .iter()
        .flat_map(|m| m.postal_codes.iter().map(|c| c.to_string()))
        .collect();
    codes.sort_unstable();
    codes
}

/// Helsinki, Espoo and Vantaa, in that order
pub fn capital_region_postal_codes() -> Vec<String> {
    ["091", "049", "092"]
        .iter()
        .filter_map(|code| municipality(code))
        .flat_map(|m| m.postal_codes.iter().map(|c| c.to_string()))
        .collect()
}

/// Inclusive year range as strings
pub fn year_range(start: i32, end: i32) -> Vec<String> {
    (start..=end).map(|y| y.to_string()).collect()
}

/// [`FETCH_START_YEAR`] through the current year.
///
/// Years the table does not have yet are dropped during validation.
pub fn default_years() -> Vec<String> {
    year_range(FETCH_START_YEAR, chrono::Local::now().year())
}
