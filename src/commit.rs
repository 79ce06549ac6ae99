use miette::miette;

use crate::change_id::ChangeId;
use crate::commit_hash::CommitHash;
use crate::patchset_tag::PatchsetTag;

/// A commit object, parsed from `git cat-file -p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub parents: Vec<CommitHash>,
    /// The raw `author` header: `Name <email> timestamp offset`.
    pub author: Option<String>,
    /// The first line of the message.
    pub subject: String,
    /// The full message.
    pub message: String,
}

impl CommitRecord {
    pub fn parse(data: &str) -> miette::Result<Self> {
        let (head, message) = data.split_once("\n\n").unwrap_or((data, ""));

        let mut has_tree = false;
        let mut parents = Vec::new();
        let mut author = None;

        for line in head.lines() {
            // Continuation of a multi-line header, like `gpgsig`.
            if line.starts_with(' ') {
                continue;
            }
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "tree" => has_tree = true,
                "parent" => parents.push(CommitHash::from(value)),
                "author" => author = Some(value.to_owned()),
                _ => {}
            }
        }

        if !has_tree {
            return Err(miette!("Commit object has no tree:\n{data}"));
        }

        Ok(Self {
            parents,
            author,
            subject: message.lines().next().unwrap_or_default().to_owned(),
            message: message.to_owned(),
        })
    }

    /// The patchset tag in this commit's subject, if any.
    pub fn patchset_tag(&self) -> Option<PatchsetTag<'_>> {
        PatchsetTag::parse(&self.subject)
    }

    pub fn change_id(&self) -> Option<ChangeId> {
        ChangeId::from_commit_message(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patchset::Patchset;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse() {
        let commit = CommitRecord::parse(indoc!(
            "
            tree 9bb3b3ecbdb0bbd1d5e6d8bd3a0e1a0c0f2c6d11
            parent 1111111111111111111111111111111111111111
            author Rebecca Turner <rbt@sent.as> 1700000000 -0800
            committer Rebecca Turner <rbt@sent.as> 1700000100 -0800

            Add frobnicator [patchset 2]

            Change-Id: I0123456789abcdef0123456789abcdef01234567
            "
        ))
        .unwrap();

        assert_eq!(
            commit,
            CommitRecord {
                parents: vec![CommitHash::from("1111111111111111111111111111111111111111")],
                author: Some("Rebecca Turner <rbt@sent.as> 1700000000 -0800".to_owned()),
                subject: "Add frobnicator [patchset 2]".to_owned(),
                message: indoc!(
                    "
                    Add frobnicator [patchset 2]

                    Change-Id: I0123456789abcdef0123456789abcdef01234567
                    "
                )
                .to_owned(),
            }
        );
        assert_eq!(
            commit.patchset_tag(),
            Some(PatchsetTag::new("Add frobnicator", Patchset::new(2)))
        );
        assert_eq!(
            commit.change_id(),
            Some(ChangeId::from("I0123456789abcdef0123456789abcdef01234567"))
        );
    }

    #[test]
    fn test_parse_merge_with_signature() {
        let commit = CommitRecord::parse(indoc!(
            "
            tree 9bb3b3ecbdb0bbd1d5e6d8bd3a0e1a0c0f2c6d11
            parent 1111111111111111111111111111111111111111
            parent 2222222222222222222222222222222222222222
            author Rebecca Turner <rbt@sent.as> 1700000000 -0800
            committer Rebecca Turner <rbt@sent.as> 1700000100 -0800
            gpgsig -----BEGIN PGP SIGNATURE-----
             parent 3333333333333333333333333333333333333333
             -----END PGP SIGNATURE-----

            Merge branch 'frob'
            "
        ))
        .unwrap();

        assert_eq!(commit.parents.len(), 2);
        assert_eq!(commit.subject, "Merge branch 'frob'");
        assert_eq!(commit.patchset_tag(), None);
    }

    #[test]
    fn test_parse_root() {
        let commit = CommitRecord::parse(
            "tree 9bb3b3ecbdb0bbd1d5e6d8bd3a0e1a0c0f2c6d11\nauthor A <a@b> 0 +0000\n\nInitial commit\n",
        )
        .unwrap();
        assert_eq!(commit.parents, Vec::<CommitHash>::new());
        assert_eq!(commit.subject, "Initial commit");
    }

    #[test]
    fn test_parse_not_a_commit() {
        assert!(CommitRecord::parse("hello world\n").is_err());
    }
}
