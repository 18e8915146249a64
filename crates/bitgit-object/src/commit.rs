use bitgit_hash::ObjectId;
use bitgit_utils::date::Signature;
use bstr::BString;

use crate::fields::{split_headers, write_field, Field};
use crate::{ObjectError, ObjectType};

const KNOWN_HEADERS: [&[u8]; 5] = [b"tree", b"parent", b"author", b"committer", b"encoding"];

/// A commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    /// Empty for a root commit.
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub encoding: Option<BString>,
    /// Headers after `encoding`, in payload order, with continuation lines
    /// unfolded. Signatures live here too: git appends `gpgsig` after any
    /// `mergetag` when signing a merge.
    pub extra_headers: Vec<(BString, BString)>,
    pub message: BString,
}

impl Commit {
    /// Parse a commit payload.
    ///
    /// Headers must appear in canonical order: `tree`, any `parent`s,
    /// `author`, `committer`, then the optional `encoding`. Anything else
    /// after that is kept in `extra_headers`.
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let (fields, message) = split_headers(content)?;
        let mut fields = fields.into_iter().peekable();

        let tree = expect(&mut fields, b"tree", "tree")?.oid()?;

        let mut parents = Vec::new();
        while let Some(f) = fields.next_if(|f| f.key == b"parent") {
            parents.push(f.oid()?);
        }

        let author = expect(&mut fields, b"author", "author")?.signature()?;
        let committer = expect(&mut fields, b"committer", "committer")?.signature()?;
        let encoding = fields
            .next_if(|f| f.key == b"encoding")
            .map(|f| BString::from(f.value));

        let mut extra_headers = Vec::new();
        for f in fields {
            if KNOWN_HEADERS.iter().any(|k| *k == f.key) {
                return Err(ObjectError::InvalidHeader(format!(
                    "duplicate or misplaced '{}' header",
                    f.key_str()
                )));
            }
            extra_headers.push((BString::from(f.key), BString::from(f.value)));
        }

        let commit = Self {
            tree,
            parents,
            author,
            committer,
            encoding,
            extra_headers,
            message: BString::from(message),
        };
        if commit.serialize_content() != content {
            return Err(ObjectError::NonCanonical(ObjectType::Commit));
        }
        Ok(commit)
    }

    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256 + self.message.len());
        write_field(&mut out, b"tree", self.tree.to_hex().as_bytes());
        for parent in &self.parents {
            write_field(&mut out, b"parent", parent.to_hex().as_bytes());
        }
        write_field(&mut out, b"author", &self.author.to_bytes());
        write_field(&mut out, b"committer", &self.committer.to_bytes());
        if let Some(enc) = &self.encoding {
            write_field(&mut out, b"encoding", enc);
        }
        for (key, value) in &self.extra_headers {
            write_field(&mut out, key, value);
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}

fn expect<'a, I>(
    fields: &mut std::iter::Peekable<I>,
    key: &[u8],
    name: &'static str,
) -> Result<Field<'a>, ObjectError>
where
    I: Iterator<Item = Field<'a>>,
{
    fields
        .next_if(|f| f.key == key)
        .ok_or(ObjectError::MissingCommitField { field: name })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    fn sample() -> Vec<u8> {
        format!(
            "tree {TREE}\n\
             parent 0000000000000000000000000000000000000001\n\
             author John Doe <john@example.com> 1234567890 +0000\n\
             committer Jane Doe <jane@example.com> 1234567890 -0700\n\
             \n\
             Initial commit\n"
        )
        .into_bytes()
    }

    #[test]
    fn parse_fields() {
        let commit = Commit::parse(&sample()).unwrap();
        assert_eq!(commit.tree.to_hex(), TREE);
        assert_eq!(commit.parents.len(), 1);
        assert_eq!(commit.author.name, "John Doe");
        assert_eq!(commit.committer.date.tz_offset, -420);
        assert_eq!(commit.message, "Initial commit\n");
    }

    #[test]
    fn reserializes_identically() {
        let data = sample();
        assert_eq!(Commit::parse(&data).unwrap().serialize_content(), data);
    }

    #[test]
    fn merge_with_encoding_signature_and_extras() {
        let data = format!(
            "tree {TREE}\n\
             parent 0000000000000000000000000000000000000001\n\
             parent 0000000000000000000000000000000000000002\n\
             author A <a@b.c> 1000000000 +0100\n\
             committer A <a@b.c> 1000000000 +0100\n\
             encoding ISO-8859-1\n\
             gpgsig -----BEGIN PGP SIGNATURE-----\n \n abc\n -----END PGP SIGNATURE-----\n\
             mergetag object 0000000000000000000000000000000000000003\n type commit\n\
             \n\
             Merge\n"
        )
        .into_bytes();
        let commit = Commit::parse(&data).unwrap();
        assert_eq!(commit.parents.len(), 2);
        assert_eq!(commit.encoding.as_ref().unwrap(), "ISO-8859-1");
        assert_eq!(commit.extra_headers.len(), 2);
        assert_eq!(commit.extra_headers[0].0, "gpgsig");
        assert_eq!(
            commit.extra_headers[0].1,
            "-----BEGIN PGP SIGNATURE-----\n\nabc\n-----END PGP SIGNATURE-----"
        );
        assert_eq!(commit.extra_headers[1].0, "mergetag");
        assert_eq!(commit.serialize_content(), data);
    }

    #[test]
    fn signed_merge_of_signed_tag() {
        // `git merge -S` of a signed tag: mergetag first, gpgsig appended last.
        let data = format!(
            "tree {TREE}\n\
             parent 0000000000000000000000000000000000000001\n\
             parent 0000000000000000000000000000000000000002\n\
             author A <a@b.c> 1000000000 +0100\n\
             committer A <a@b.c> 1000000000 +0100\n\
             mergetag object 0000000000000000000000000000000000000002\n \
             type commit\n \
             tag v1\n \
             tagger T <t@b.c> 1000000000 +0000\n \n \
             v1\n \
             -----BEGIN PGP SIGNATURE-----\n \
             tagsig\n \
             -----END PGP SIGNATURE-----\n\
             gpgsig -----BEGIN PGP SIGNATURE-----\n \
             abc\n \
             -----END PGP SIGNATURE-----\n\
             \n\
             Merge tag 'v1'\n"
        )
        .into_bytes();
        let commit = Commit::parse(&data).unwrap();
        let keys: Vec<_> = commit.extra_headers.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, ["mergetag", "gpgsig"]);
        assert!(commit.extra_headers[0].1.starts_with(b"object 0000"));
        assert_eq!(commit.serialize_content(), data);
    }

    #[test]
    fn encoding_after_extra_header_rejected() {
        let data = format!(
            "tree {TREE}\nauthor A <a@b.c> 0 +0000\ncommitter A <a@b.c> 0 +0000\nx-a 1\nencoding UTF-8\n\nmsg\n"
        );
        assert!(matches!(
            Commit::parse(data.as_bytes()),
            Err(ObjectError::InvalidHeader(_))
        ));
    }

    #[test]
    fn empty_message_allowed() {
        let data = format!(
            "tree {TREE}\nauthor A <a@b.c> 0 +0000\ncommitter A <a@b.c> 0 +0000\n\n"
        );
        let commit = Commit::parse(data.as_bytes()).unwrap();
        assert!(commit.parents.is_empty());
        assert!(commit.message.is_empty());
    }

    #[test]
    fn missing_tree() {
        let data = b"author A <a@b.c> 0 +0000\ncommitter A <a@b.c> 0 +0000\n\nmsg\n";
        assert!(matches!(
            Commit::parse(data),
            Err(ObjectError::MissingCommitField { field: "tree" })
        ));
    }

    #[test]
    fn missing_committer() {
        let data = format!("tree {TREE}\nauthor A <a@b.c> 0 +0000\n\nmsg\n");
        assert!(matches!(
            Commit::parse(data.as_bytes()),
            Err(ObjectError::MissingCommitField { field: "committer" })
        ));
    }

    #[test]
    fn duplicate_tree_rejected() {
        let data = format!(
            "tree {TREE}\nauthor A <a@b.c> 0 +0000\ncommitter A <a@b.c> 0 +0000\ntree {TREE}\n\nmsg\n"
        );
        assert!(matches!(
            Commit::parse(data.as_bytes()),
            Err(ObjectError::InvalidHeader(_))
        ));
    }

    #[test]
    fn parent_after_author_rejected() {
        let data = format!(
            "tree {TREE}\nauthor A <a@b.c> 0 +0000\nparent {TREE}\ncommitter A <a@b.c> 0 +0000\n\nmsg\n"
        );
        assert!(Commit::parse(data.as_bytes()).is_err());
    }

    #[test]
    fn bad_signature_rejected() {
        let data = format!("tree {TREE}\nauthor nobody\ncommitter A <a@b.c> 0 +0000\n\nmsg\n");
        assert!(matches!(
            Commit::parse(data.as_bytes()),
            Err(ObjectError::InvalidSignature(_))
        ));
    }

    #[test]
    fn truncated_tree_id_rejected() {
        let data = b"tree 4b825dc6\nauthor A <a@b.c> 0 +0000\ncommitter A <a@b.c> 0 +0000\n\nmsg\n";
        assert!(matches!(Commit::parse(data), Err(ObjectError::Hash(_))));
    }

    #[test]
    fn uppercase_id_is_not_canonical() {
        let data = format!(
            "tree {}\nauthor A <a@b.c> 0 +0000\ncommitter A <a@b.c> 0 +0000\n\nmsg\n",
            TREE.to_ascii_uppercase()
        );
        assert!(matches!(
            Commit::parse(data.as_bytes()),
            Err(ObjectError::NonCanonical(ObjectType::Commit))
        ));
    }

    #[test]
    fn extra_whitespace_in_signature_is_not_canonical() {
        let data = format!("tree {TREE}\nauthor A  <a@b.c> 0 +0000\ncommitter A <a@b.c> 0 +0000\n\nmsg\n");
        assert!(matches!(
            Commit::parse(data.as_bytes()),
            Err(ObjectError::NonCanonical(_))
        ));
    }
}
