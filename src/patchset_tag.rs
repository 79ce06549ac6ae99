use std::fmt::Display;
use std::sync::OnceLock;

use regex::Regex;

use crate::patchset::Patchset;

/// A commit subject tagged with the patchset it was cherry-picked from, like
/// `Add frobnicator [patchset 3]`.
///
/// [`PatchsetTag::parse`] and the [`Display`] implementation are exact inverses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchsetTag<'a> {
    /// The subject without the tag.
    pub subject: &'a str,
    pub patchset: Patchset,
}

impl<'a> PatchsetTag<'a> {
    pub fn new(subject: &'a str, patchset: Patchset) -> Self {
        Self { subject, patchset }
    }

    /// Parse a tagged commit subject. Returns `None` for untagged subjects.
    pub fn parse(subject: &'a str) -> Option<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let captures = RE
            .get_or_init(|| {
                Regex::new(
                    r"(?xs)
                    ^
                    (?P<subject>.*)
                    \ \[patchset\ (?P<patchset>[1-9][0-9]*)\]
                    $
                    ",
                )
                .expect("Regex parses")
            })
            .captures(subject)?;

        let patchset = captures["patchset"].parse().ok()?;
        let subject = captures.name("subject")?.as_str();
        Some(Self { subject, patchset })
    }
}

impl Display for PatchsetTag<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [patchset {}]", self.subject, self.patchset)
    }
}

/// Tag the first line of a commit message with a patchset number, keeping the rest of the message
/// intact.
pub fn tag_message(message: &str, patchset: Patchset) -> String {
    let (subject, rest) = match message.split_once('\n') {
        Some((subject, rest)) => (subject, Some(rest)),
        None => (message, None),
    };
    let tagged = PatchsetTag::new(subject, patchset).to_string();
    match rest {
        Some(rest) => format!("{tagged}\n{rest}"),
        None => tagged,
    }
}
