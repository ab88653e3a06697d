//! OSI license categories (<https://opensource.org/licenses/category>).
//!
//! Entries are SPDX identifiers where one exists and OSI display names otherwise.
//! An entry ending in `*` matches every identifier with that prefix.

use serde::Serialize;

const POPULAR: &[&str] = &[
    "Apache-2.0",
    "BSD-3-Clause",
    "BSD-2-Clause",
    "GPL",
    "LGPL",
    "MIT",
    "MPL-2.0",
    "CDDL-1.0",
    "EPL-2.0",
];

const CREATIVE_COMMONS: &[&str] = &["CC*"];

const INTERNATIONAL: &[&str] = &[
    "EUPL-1.2",
    "LiLiQ-P",
    "LiLiQ-P-1.1",
    "LiLiQ-R",
    "LiLiQ-R-1.1",
    "LiLiQ-R+",
    "LiLiQ-Rplus-1.1",
    "MulanPSL-2.0",
];

const SPECIAL_PURPOSE: &[&str] = &[
    "BSD-2-Clause-Patent",
    "CERN Open Hardware Licence Version 2 - Permissive",
    "CERN Open Hardware Licence Version 2 - Weakly Reciprocal",
    "CERN Open Hardware Licence Version 2 - Strongly Reciprocal",
    "ECL-2.0",
    "IPA",
    "BSD-3-Clause-LBNL",
    "NASA-1.3",
    "OSET-PL-2.1",
    "OFL-1.1",
    "Unlicense",
    "UCL-1.0",
];

const MISCELLANEOUS: &[&str] = &[
    "0BSD",
    "BSD-1-Clause",
    "APL-1.0",
    "Artistic-2.0",
    "Jam",
    "MIT-0",
    "OSL-3.0",
    "QPL-1.0",
    "UPL",
    "Zlib",
];

const REDUNDANT: &[&str] = &[
    "AFL-3.0",
    "AAL",
    "EFL-2.0",
    "Fair",
    "HPND",
    "LPL-1.02",
    "OLDAP-2.8",
    "PostgreSQL",
    "NCSA",
    "Xnet",
    "Zope Public License 2.1",
];

const NON_REUSABLE: &[&str] = &[
    "APSL-2.0",
    "CATOSL-1.1",
    "eCos License version 2.0",
    "EUDatagrid",
    "Entessa",
    "Frameworx-1.0",
    "IPL-1.0",
    "LPPL-1.3c",
    "Motosoto",
    "Multics",
    "Naumen",
    "NGPL",
    "Nokia",
    "OCLC-2.0",
    "Python-2.0",
    "CNRI-Python",
    "RPSL-1.0",
    "RSCPL",
    "Sleepycat",
    "SPL-1.0",
    "Watcom-1.0",
    "VSL-1.0",
    "W3C",
    "WXwindows",
];

const SUPERSEDED: &[&str] = &[
    "Apache-1.1",
    "Artistic-1.0",
    "CPL-1.0",
    "EPL-1.0",
    "ECL-1.0",
    "EFL-1.0",
    "EUPL-1.1",
    "LPL-1.0",
    "MPL-1.0",
    "MPL-1.1",
    "OSL-1.0",
    "OSL-2.1",
    "PHP-3.0",
    "RPL-1.1",
    "ZPL-2.0",
];

const RETIRED: &[&str] = &[
    "CUA-OPL-1.0",
    "Intel",
    "Jabber Open Source License",
    "CVW",
    "SISSL",
];

const UNCATEGORIZED: &[&str] = &[
    "BSL-1.0",
    "CAL-1.0",
    "CPAL-1.0",
    "AGPL-3.0",
    "ISC",
    "MS-PL",
    "MS-RL",
    "MirOS",
    "NPOSL-3.0",
    "NTP",
    "vOGTSL",
    "RPL-1.5",
    "SimPL-2.0",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Popular,
    CreativeCommons,
    International,
    SpecialPurpose,
    Miscellaneous,
    Redundant,
    NonReusable,
    Superseded,
    Retired,
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Popular,
        Category::CreativeCommons,
        Category::International,
        Category::SpecialPurpose,
        Category::Miscellaneous,
        Category::Redundant,
        Category::NonReusable,
        Category::Superseded,
        Category::Retired,
        Category::Uncategorized,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Popular => "Popular / Strong Community",
            Category::CreativeCommons => "Creative Commons",
            Category::International => "International",
            Category::SpecialPurpose => "Special Purpose",
            Category::Miscellaneous => "Other / Miscellaneous",
            Category::Redundant => "Redundant with more popular licenses",
            Category::NonReusable => "Non-reusable",
            Category::Superseded => "Superseded",
            Category::Retired => "Voluntarily retired",
            Category::Uncategorized => "Uncategorized",
        }
    }

    pub fn identifiers(self) -> &'static [&'static str] {
        match self {
            Category::Popular => POPULAR,
            Category::CreativeCommons => CREATIVE_COMMONS,
            Category::International => INTERNATIONAL,
            Category::SpecialPurpose => SPECIAL_PURPOSE,
            Category::Miscellaneous => MISCELLANEOUS,
            Category::Redundant => REDUNDANT,
            Category::NonReusable => NON_REUSABLE,
            Category::Superseded => SUPERSEDED,
            Category::Retired => RETIRED,
            Category::Uncategorized => UNCATEGORIZED,
        }
    }

    /// Identifier matching is ASCII case-insensitive, as SPDX identifiers are.
    pub fn contains(self, identifier: &str) -> bool {
        self.identifiers()
            .iter()
            .any(|entry| entry_matches(entry, identifier))
    }
}

fn entry_matches(entry: &str, identifier: &str) -> bool {
    match entry.strip_suffix('*') {
        Some(prefix) => identifier
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        None => entry.eq_ignore_ascii_case(identifier),
    }
}

/// Every category `identifier` is listed under, in [`Category::ALL`] order.
pub fn categories_for(identifier: &str) -> Vec<Category> {
    let identifier = identifier.trim();
    Category::ALL
        .into_iter()
        .filter(|category| category.contains(identifier))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popular_licenses_are_found() {
        assert_eq!(categories_for("MIT"), vec![Category::Popular]);
        assert_eq!(categories_for("apache-2.0"), vec![Category::Popular]);
    }

    #[test]
    fn creative_commons_matches_by_prefix() {
        assert_eq!(categories_for("CC-BY-4.0"), vec![Category::CreativeCommons]);
        assert_eq!(categories_for("cc0-1.0"), vec![Category::CreativeCommons]);
        assert!(categories_for("C").is_empty());
    }

    #[test]
    fn display_names_are_matched_whole() {
        assert_eq!(
            categories_for("Zope Public License 2.1"),
            vec![Category::Redundant]
        );
        assert!(categories_for("Zope").is_empty());
    }

    #[test]
    fn unknown_identifiers_have_no_category() {
        assert!(categories_for("WTFPL").is_empty());
        assert!(categories_for("").is_empty());
    }

    #[test]
    fn lists_have_no_duplicates() {
        for category in Category::ALL {
            let ids = category.identifiers();
            for (i, id) in ids.iter().enumerate() {
                assert!(
                    !ids[i + 1..].contains(id),
                    "{id} listed twice in {}",
                    category.label()
                );
            }
        }
    }
}
