use serde::de::DeserializeOwned;

/// The rows of a `gerrit query --format json` response.
///
/// Gerrit writes one JSON object per change, followed by a statistics row.
#[derive(Debug)]
pub struct QueryResult<T> {
    pub changes: Vec<T>,
    pub stats: Option<QueryStatistics>,
    /// Why parsing stopped early, if it did.
    pub error: Option<String>,
}

impl<T> QueryResult<T>
where
    T: DeserializeOwned,
{
    /// Parse the rows of a query response.
    ///
    /// The output is parsed as a stream of JSON values rather than line by line, so whitespace
    /// and line breaks between rows don't matter. Parsing stops at the first malformed row; rows
    /// before it are kept and the error is recorded.
    pub fn from_stdout(stdout: &str) -> Self {
        let mut ret = Self {
            changes: Vec::new(),
            stats: None,
            error: None,
        };

        for row in serde_json::Deserializer::from_str(stdout).into_iter::<serde_json::Value>() {
            let row = match row {
                Ok(row) => row,
                Err(error) => {
                    tracing::debug!(%error, "Stopped parsing query output");
                    ret.error = Some(error.to_string());
                    break;
                }
            };

            let is_stats = row
                .as_object()
                .and_then(|object| object.get("type"))
                .and_then(|type_value| type_value.as_str())
                .map(|stats_value| stats_value == "stats")
                .unwrap_or(false);

            if is_stats {
                match serde_json::from_value::<QueryStatistics>(row) {
                    Ok(stats) => ret.stats = Some(stats),
                    Err(error) => tracing::debug!(%error, "Failed to parse query statistics"),
                }
            } else {
                match serde_json::from_value::<T>(row) {
                    Ok(change) => ret.changes.push(change),
                    Err(error) => {
                        ret.error = Some(error.to_string());
                        break;
                    }
                }
            }
        }

        ret
    }

    /// The first change in the response, or a description of why there isn't one.
    pub fn into_first_change(self) -> Result<T, String> {
        match self.changes.into_iter().next() {
            Some(change) => Ok(change),
            None => Err(match (self.error, self.stats) {
                (Some(error), _) => error,
                (None, Some(stats)) => format!("query matched {} changes", stats.row_count),
                (None, None) => "empty response".to_owned(),
            }),
        }
    }
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatistics {
    pub row_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
    struct Row {
        id: String,
    }

    #[test]
    fn test_from_stdout() {
        let result = QueryResult::<Row>::from_stdout(indoc!(
            r#"
            {"id":"Iaaaa","project":"frob"}
            {"type":"stats","rowCount":1,"runTimeMilliseconds":3,"moreChanges":false}
            "#
        ));
        assert_eq!(result.changes, vec![Row { id: "Iaaaa".to_owned() }]);
        assert_eq!(result.stats.unwrap().row_count, 1);
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_from_stdout_trailing_garbage() {
        let result =
            QueryResult::<Row>::from_stdout("{\"id\":\"Iaaaa\"} {\"id\":\"Ibbbb\"}\nConnection closed.\n");
        assert!(result.error.is_some());
        assert_eq!(result.into_first_change(), Ok(Row { id: "Iaaaa".to_owned() }));
    }

    #[test]
    fn test_from_stdout_pretty_printed() {
        let result = QueryResult::<Row>::from_stdout(indoc!(
            r#"
            {
              "id": "Iaaaa"
            }
            "#
        ));
        assert_eq!(result.into_first_change(), Ok(Row { id: "Iaaaa".to_owned() }));
    }

    #[test]
    fn test_into_first_change_stats_only() {
        let result = QueryResult::<Row>::from_stdout(
            r#"{"type":"stats","rowCount":0,"runTimeMilliseconds":3,"moreChanges":false}"#,
        );
        assert_eq!(
            result.into_first_change(),
            Err("query matched 0 changes".to_owned())
        );
    }

    #[test]
    fn test_into_first_change_malformed() {
        let result = QueryResult::<Row>::from_stdout("Permission denied (publickey).\n");
        assert!(result.into_first_change().is_err());

        let result = QueryResult::<Row>::from_stdout("");
        assert_eq!(result.into_first_change(), Err("empty response".to_owned()));
    }

    #[test]
    fn test_into_first_change_missing_field() {
        let result = QueryResult::<Row>::from_stdout(r#"{"project":"frob"}"#);
        assert_eq!(
            result.into_first_change(),
            Err("missing field `id`".to_owned())
        );
    }
}
