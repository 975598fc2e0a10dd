use serde::{Deserialize, Serialize};

/// Named search options handed to the index. The benchmark mirrors one
/// value into both keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Candidate list size. Larger trades speed for recall.
    #[serde(rename = "L_search")]
    pub l_search: usize,
    #[serde(rename = "P_search")]
    pub p_search: usize,
    /// Seed for topping up the initial candidate list.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    0x533D
}

impl SearchParams {
    pub fn from_search_l(search_l: usize) -> Self {
        Self {
            l_search: search_l,
            p_search: search_l,
            seed: default_seed(),
        }
    }

    /// Looks an option up by its index-side name.
    pub fn get(&self, name: &str) -> Option<usize> {
        match name {
            "L_search" => Some(self.l_search),
            "P_search" => Some(self.p_search),
            _ => None,
        }
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::from_search_l(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_keys_mirror_search_l() {
        let sp = SearchParams::from_search_l(64);
        assert_eq!(sp.get("L_search"), Some(64));
        assert_eq!(sp.get("P_search"), Some(64));
        assert_eq!(sp.get("K_search"), None);
    }

    #[test]
    fn parse_from_json() {
        let sp: SearchParams =
            serde_json::from_str(r#"{"L_search": 200, "P_search": 150}"#).unwrap();
        assert_eq!(sp.l_search, 200);
        assert_eq!(sp.p_search, 150);
        assert_eq!(sp.seed, 0x533D);
    }
}
