/// Options for performing a `gerrit query`.
///
/// Only the options this tool needs are modeled.
#[derive(Default, Debug, Clone)]
pub struct GerritQuery {
    /// The query to execute.
    query: String,
    /// Include information about all patch sets
    patch_sets: bool,
}

impl GerritQuery {
    /// Construct query options wrapping the given string.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            patch_sets: false,
        }
    }

    /// Convert this query into CLI options, to be appended to `gerrit`.
    pub fn into_args(self) -> Vec<String> {
        let mut args = vec!["query".to_owned(), "--format".to_owned(), "json".to_owned()];

        if self.patch_sets {
            args.push("--patch-sets".to_owned());
        }

        args.push("--".to_owned());
        args.push(self.query);

        args
    }

    /// Include information about all patch sets.
    pub fn patch_sets(mut self) -> Self {
        self.patch_sets = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_into_args() {
        assert_eq!(
            GerritQuery::new("12345").patch_sets().into_args(),
            vec!["query", "--format", "json", "--patch-sets", "--", "12345"]
        );
        assert_eq!(
            GerritQuery::new("I0123456789abcdef0123456789abcdef01234567").into_args(),
            vec![
                "query",
                "--format",
                "json",
                "--",
                "I0123456789abcdef0123456789abcdef01234567"
            ]
        );
    }
}
