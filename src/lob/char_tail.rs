use crate::{LobError, LobResult};

// Character LOB pieces must not cut through a multi-byte character, so the
// writer trims every piece to the last character boundary and keeps the cut
// bytes buffered until the next write completes them.

// Splits `utf8` so that the leading part ends on a character boundary, and
// converts it to CESU-8. The returned tail holds the bytes of an incomplete
// trailing character.
pub(crate) fn utf8_to_cesu8_and_utf8_tail(mut utf8: Vec<u8>) -> LobResult<(Vec<u8>, Vec<u8>)> {
    let tail = utf8.split_off(utf8.len() - utf8_tail_len(&utf8)?);
    let head = String::from_utf8(utf8).map_err(|_| LobError::Cesu8)?;
    Ok((cesu8::to_cesu8(&head).to_vec(), tail))
}

// Number of trailing bytes that belong to an incomplete UTF-8 character.
// A sequence start must occur within the last four bytes; input that ends in
// a longer run of continuation bytes is malformed.
pub(crate) fn utf8_tail_len(bytes: &[u8]) -> LobResult<usize> {
    for back in 0..std::cmp::min(bytes.len(), 4) {
        let index = bytes.len() - 1 - back;
        if let Some(seq_len) = utf8_seq_len(bytes[index]) {
            return Ok(match (index + seq_len).cmp(&bytes.len()) {
                std::cmp::Ordering::Greater => bytes.len() - index,
                std::cmp::Ordering::Equal => 0,
                // stray continuation bytes after a complete character;
                // deferred to the decoder
                std::cmp::Ordering::Less => bytes.len() - index - seq_len,
            });
        }
    }
    if bytes.is_empty() {
        Ok(0)
    } else {
        Err(LobError::Cesu8)
    }
}

// Sequence length announced by a UTF-8 start byte; None for continuation
// and illegal bytes.
fn utf8_seq_len(byte: u8) -> Option<usize> {
    match byte.leading_ones() {
        0 => Some(1),
        2 => Some(2),
        3 => Some(3),
        4 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::{utf8_tail_len, utf8_to_cesu8_and_utf8_tail};

    #[test]
    fn test_tail_len() {
        assert_eq!(utf8_tail_len(b"").unwrap(), 0);
        assert_eq!(utf8_tail_len(b"plain ascii").unwrap(), 0);
        assert_eq!(utf8_tail_len("grüße".as_bytes()).unwrap(), 0);

        let s = "grüße".as_bytes();
        // cutting the two-byte 'ß' in half leaves a one-byte tail
        assert_eq!(utf8_tail_len(&s[..5]).unwrap(), 1);

        let smiley = "ok 😀".as_bytes(); // four-byte character
        assert_eq!(utf8_tail_len(smiley).unwrap(), 0);
        assert_eq!(utf8_tail_len(&smiley[..6]).unwrap(), 3);
        assert_eq!(utf8_tail_len(&smiley[..5]).unwrap(), 2);
        assert_eq!(utf8_tail_len(&smiley[..4]).unwrap(), 1);

        // continuation bytes only: no sequence start within reach
        assert!(utf8_tail_len(&[0x80, 0x80, 0x80, 0x80, 0x80]).is_err());
    }

    #[test]
    fn test_cesu8_split() {
        let mut bytes = "hällo wörld".as_bytes().to_vec();
        bytes.truncate(bytes.len() - 1); // cut 'd' is fine, cut nothing multi-byte
        let (cesu8, tail) = utf8_to_cesu8_and_utf8_tail(bytes).unwrap();
        assert!(tail.is_empty());
        assert_eq!(cesu8::from_cesu8(&cesu8).unwrap(), "hällo wörl");

        // a supplementary-plane character becomes a surrogate pair in CESU-8
        let (cesu8, tail) = utf8_to_cesu8_and_utf8_tail("a😀".as_bytes().to_vec()).unwrap();
        assert!(tail.is_empty());
        assert_eq!(cesu8.len(), 7);
        assert_eq!(cesu8::from_cesu8(&cesu8).unwrap(), "a😀");

        // incomplete character at the end goes into the tail
        let mut bytes = "ab😀".as_bytes().to_vec();
        bytes.truncate(4);
        let (cesu8, tail) = utf8_to_cesu8_and_utf8_tail(bytes).unwrap();
        assert_eq!(cesu8, b"ab");
        assert_eq!(tail.len(), 2);
    }
}
