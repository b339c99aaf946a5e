use std::{
	collections::{HashMap, HashSet},
	sync::LazyLock,
};

use crate::model::Unit;

/// Free-text aliases to canonical unit codes, in priority order. Matching
/// tiers that scan (substring, word overlap) walk this slice front to back,
/// so results are deterministic.
const ALIASES: &[(&str, &str)] = &[
	("american history", "NMAH"),
	("ahm", "NMAH"),
	("natural history", "NMNH"),
	("american art", "SAAM"),
	("american indian", "NMAI"),
	("air and space", "NASM"),
	("asian art", "FSG"),
	("portrait gallery", "NPG"),
	("african art", "NMAfA"),
	("hirshhorn", "HMSG"),
	("sculpture garden", "HMSG"),
	("cooper hewitt", "CHNDM"),
	("design", "CHNDM"),
	("african american history", "NMAAHC"),
	("freer", "FSG"),
	("sackler", "FSG"),
	("renwick", "SAAM"),
	("postal", "NPM"),
	("zoo", "NZP"),
	("anacostia", "ACM"),
	("smithsonian asian art", "FSG"),
	("smithsonian asian art museum", "FSG"),
	("national museum of asian art", "FSG"),
	("freer and sackler galleries", "FSG"),
	("freer gallery", "FSG"),
	("sackler gallery", "FSG"),
	("smithsonian american art", "SAAM"),
	("smithsonian american art museum", "SAAM"),
	("national museum of american art", "SAAM"),
	("renwick gallery", "SAAM"),
	("national museum of natural history", "NMNH"),
	("national air and space museum", "NASM"),
	("national portrait gallery", "NPG"),
	("national museum of african art", "NMAfA"),
	("hirshhorn museum", "HMSG"),
	("hirshhorn museum and sculpture garden", "HMSG"),
	("cooper hewitt museum", "CHNDM"),
	("smithsonian design museum", "CHNDM"),
	("national museum of african american history and culture", "NMAAHC"),
	("national postal museum", "NPM"),
	("national zoo", "NZP"),
	("anacostia community museum", "ACM"),
	("smithsonian archives", "SIA"),
	("smithsonian institution archives", "SIA"),
	("minerals", "NMNHMINSCI"),
	("mineral", "NMNHMINSCI"),
	("dinosaur", "NMNHPALEO"),
	("paleontology", "NMNHPALEO"),
	("anthropology", "NMNHANTHRO"),
	("birds", "NMNHBIRDS"),
	("plants", "NMNHBOTANY"),
	("entomology", "NMNHENTO"),
	("fish", "NMNHFISHES"),
	("fishes", "NMNHFISHES"),
	("herpetology", "NMNHHERPS"),
	("invertebrate", "NMNHINV"),
	("mammal", "NMNHMAMMALS"),
];

const VALID_CODES: &[&str] = &[
	"NMAH",
	"NMNH",
	"SAAM",
	"NASM",
	"NPG",
	"FSG",
	"HMSG",
	"NMAfA",
	"NMAI",
	"ACM",
	"NMAAHC",
	"SIA",
	"NPM",
	"NZP",
	"CHNDM",
	"NMNHMINSCI",
	"NMNHPALEO",
	"NMNHANTHRO",
	"NMNHBIRDS",
	"NMNHBOTANY",
	"NMNHEDUCATION",
	"NMNHENTO",
	"NMNHFISHES",
	"NMNHHERPS",
	"NMNHINV",
	"NMNHMAMMALS",
];

/// Generic leading phrases that carry no discriminating signal.
const GENERIC_PREFIXES: &[&str] = &["smithsonian", "national museum of", "museum of"];

static ALIAS_INDEX: LazyLock<HashMap<&'static str, &'static str>> =
	LazyLock::new(|| ALIASES.iter().copied().collect());

/// Resolves a free-text institution name to its canonical unit code.
///
/// Tiered matching; the first satisfied tier wins and later tiers are never
/// consulted. No match is a valid `None` outcome, never an error; typos and
/// unknown names are expected input.
pub fn resolve(name: &str) -> Option<&'static str> {
	let needle = name.trim().to_lowercase();

	if needle.is_empty() {
		return None;
	}

	// Tier 1: exact alias.
	if let Some(code) = ALIAS_INDEX.get(needle.as_str()) {
		return Some(code);
	}

	// Tier 2: exact alias after stripping a generic prefix.
	for prefix in GENERIC_PREFIXES {
		if let Some(rest) = needle.strip_prefix(prefix)
			&& let Some(code) = ALIAS_INDEX.get(rest.trim())
		{
			return Some(code);
		}
	}

	// Tier 3: direct canonical code, case-insensitive.
	if let Some(code) = VALID_CODES.iter().find(|code| code.eq_ignore_ascii_case(&needle)) {
		return Some(code);
	}

	// Tier 4: substring containment in either direction.
	for (alias, code) in ALIASES {
		if needle.contains(alias) || alias.contains(needle.as_str()) {
			return Some(code);
		}
	}

	// Tier 5: word overlap above half the alias key's word count.
	let needle_words: HashSet<&str> = needle.split_whitespace().collect();

	for (alias, code) in ALIASES {
		let alias_words: Vec<&str> = alias.split_whitespace().collect();
		let shared = alias_words.iter().filter(|word| needle_words.contains(**word)).count();

		if shared * 2 > alias_words.len() {
			return Some(code);
		}
	}

	None
}

/// The static institution catalog. Loaded once, immutable thereafter.
pub fn all_units() -> &'static [Unit] {
	&[
		Unit {
			code: "NMNH",
			name: "National Museum of Natural History",
			description: "Natural history museum",
			location: "Washington, DC",
		},
		Unit {
			code: "NPG",
			name: "National Portrait Gallery",
			description: "Portrait art museum",
			location: "Washington, DC",
		},
		Unit {
			code: "SAAM",
			name: "Smithsonian American Art Museum",
			description: "American art museum",
			location: "Washington, DC",
		},
		Unit {
			code: "HMSG",
			name: "Hirshhorn Museum and Sculpture Garden",
			description: "Modern and contemporary art",
			location: "Washington, DC",
		},
		Unit {
			code: "FSG",
			name: "Freer and Sackler Galleries",
			description: "Asian art museum",
			location: "Washington, DC",
		},
		Unit {
			code: "NMAfA",
			name: "National Museum of African Art",
			description: "African art museum",
			location: "Washington, DC",
		},
		Unit {
			code: "NMAI",
			name: "National Museum of the American Indian",
			description: "Native American art and culture",
			location: "Washington, DC",
		},
		Unit {
			code: "NASM",
			name: "National Air and Space Museum",
			description: "Air and space museum",
			location: "Washington, DC",
		},
		Unit {
			code: "NMAH",
			name: "National Museum of American History",
			description: "American history museum",
			location: "Washington, DC",
		},
	]
}

pub fn is_valid_code(code: &str) -> bool {
	VALID_CODES.iter().any(|valid| valid.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn canonical_codes_resolve_to_themselves() {
		assert_eq!(resolve("SAAM"), Some("SAAM"));
		assert_eq!(resolve("saam"), Some("SAAM"));
		assert_eq!(resolve("nmafa"), Some("NMAfA"));
	}

	#[test]
	fn blank_input_resolves_to_none() {
		assert_eq!(resolve(""), None);
		assert_eq!(resolve("   "), None);
	}

	#[test]
	fn exact_aliases_win_first() {
		assert_eq!(resolve("air and space"), Some("NASM"));
		assert_eq!(resolve("Cooper Hewitt"), Some("CHNDM"));
	}

	#[test]
	fn asian_art_does_not_collide_with_american_art() {
		// Regression: the "smithsonian" prefix and "art museum" suffix used to
		// pull this toward SAAM.
		assert_eq!(resolve("Smithsonian Asian Art Museum"), Some("FSG"));
		assert_eq!(resolve("Smithsonian American Art Museum"), Some("SAAM"));
	}

	#[test]
	fn generic_prefix_is_stripped_before_matching() {
		assert_eq!(resolve("smithsonian natural history"), Some("NMNH"));
		assert_eq!(resolve("museum of asian art"), Some("FSG"));
	}

	#[test]
	fn substring_containment_matches_in_either_direction() {
		assert_eq!(resolve("the national portrait gallery annex"), Some("NPG"));
		assert_eq!(resolve("portrait"), Some("NPG"));
	}

	#[test]
	fn word_overlap_catches_reordered_names() {
		assert_eq!(resolve("space and air national"), Some("NASM"));
	}

	#[test]
	fn unknown_names_are_a_valid_none() {
		assert_eq!(resolve("louvre"), None);
		assert_eq!(resolve("xyzzy"), None);
	}

	#[test]
	fn unit_catalog_codes_are_all_valid() {
		for unit in all_units() {
			assert!(is_valid_code(unit.code), "unexpected code {}", unit.code);
		}
	}
}
