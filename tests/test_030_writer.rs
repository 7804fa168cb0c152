mod test_utils;

use lobstream::{
    LobDescriptor, LobError, LobReader, LobResult, LobTypeId, LobWriter, TransferConfiguration,
    TransferOutcome,
};
use test_utils::MockLobStore;

const LOC: u64 = 11;

// cargo test test_030_writer -- --nocapture
#[test]
fn test_030_writer() -> LobResult<()> {
    test_utils::init_logger();

    aligned_pieces_and_finalize()?;
    finalize_exactly_once()?;
    destroy_twice()?;
    clob_pieces_respect_character_boundaries()?;
    nclob_roundtrip()?;
    Ok(())
}

fn writable_store() -> MockLobStore {
    MockLobStore::with_content(LOC, Vec::new())
}

// 600 bytes against a chunk size of 256 arrive in exactly three remote
// writes of [256, 256, 88], the last one carrying the finalize marker.
fn aligned_pieces_and_finalize() -> LobResult<()> {
    let store = writable_store();
    let session = test_utils::session(&store);
    let descriptor = LobDescriptor::new(LobTypeId::BLOB, 256, None);

    let mut writer = LobWriter::open(&session, LOC, descriptor)?;
    writer.write(&[0xAB; 600])?;
    writer.end()?;

    {
        let state = store.state();
        assert_eq!(state.write_sizes, vec![256, 256, 88]);
        assert_eq!(state.finalized, vec![LOC]);
        assert_eq!(state.commits, 1, "auto-commit fires once the writer finished");
        assert_eq!(state.closed, vec![LOC]);
    }
    assert_eq!(store.content(LOC), vec![0xAB; 600]);

    // the writer is finalized; further writes must be rejected
    assert!(matches!(writer.write(b"late"), Err(LobError::ClosedHandle)));
    assert!(writer.transfer_session().is_safe_to_commit());
    Ok(())
}

// Writing [c1, c2, c3] and ending finalizes exactly once.
fn finalize_exactly_once() -> LobResult<()> {
    let store = writable_store();
    let session = test_utils::session(&store);
    let descriptor = LobDescriptor::new(LobTypeId::BLOB, 1024, None);

    let mut writer = LobWriter::open(&session, LOC, descriptor)?;
    for chunk in [&b"one "[..], &b"two "[..], &b"three"[..]] {
        writer.write(chunk)?;
    }
    writer.end()?;

    let state = store.state();
    assert_eq!(state.finalized.len(), 1);
    assert_eq!(state.write_sizes, vec![13]);
    drop(state);
    assert_eq!(store.content(LOC), b"one two three");

    assert!(matches!(writer.end(), Err(LobError::ClosedHandle)));
    assert_eq!(store.state().finalized.len(), 1);
    Ok(())
}

// destroy() aborts without finalizing; the second call on the closed handle
// is a reported, non-fatal no-op.
fn destroy_twice() -> LobResult<()> {
    let store = writable_store();
    let session = test_utils::session(&store);
    let descriptor = LobDescriptor::new(LobTypeId::BLOB, 256, None);

    let mut writer = LobWriter::open(&session, LOC, descriptor)?;
    let errors = std::sync::Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
    {
        let errors = std::sync::Arc::clone(&errors);
        writer
            .transfer_session()
            .on_error(move |e| errors.lock().unwrap().push(e.to_string()))?;
    }

    writer.write(b"to be discarded")?;
    writer.destroy(None)?;

    {
        let state = store.state();
        assert_eq!(state.rollbacks, 1, "an aborted writer signals rollback");
        assert_eq!(state.commits, 0);
        assert!(state.finalized.is_empty(), "an aborted value is never finalized");
        assert_eq!(state.write_sizes, Vec::<usize>::new());
        assert_eq!(state.closed, vec![LOC]);
    }
    assert_eq!(errors.lock().unwrap().len(), 1);
    assert_eq!(writer.transfer_session().outcome(), Some(TransferOutcome::Aborted));

    // second destroy: AlreadyClosed, nothing else happens
    assert!(matches!(writer.destroy(None), Err(LobError::AlreadyClosed)));
    assert_eq!(store.state().rollbacks, 1);
    assert_eq!(errors.lock().unwrap().len(), 1);
    Ok(())
}

// With a tiny write length, pieces are forwarded during write(), and the cut
// points never split a multi-byte character.
fn clob_pieces_respect_character_boundaries() -> LobResult<()> {
    let store = writable_store();
    let configuration = TransferConfiguration::default().with_lob_write_length(4);
    let session = test_utils::session_with(&store, configuration);
    let descriptor = LobDescriptor::new(LobTypeId::CLOB, 4, None);

    let text = "abcdäefg";
    let bytes = text.as_bytes(); // the 'ä' spans bytes 4..6

    let mut writer = LobWriter::open(&session, LOC, descriptor)?;
    writer.write(&bytes[..5])?; // ends in the middle of 'ä'
    writer.write(&bytes[5..])?;
    writer.end()?;

    assert_eq!(store.content(LOC), bytes);
    assert_eq!(store.state().write_sizes, vec![4, 4, 1]);

    // a stream that ends within a character is refused and aborted
    let store = writable_store();
    let session = test_utils::session(&store);
    let descriptor = LobDescriptor::new(LobTypeId::CLOB, 256, None);
    let mut writer = LobWriter::open(&session, LOC, descriptor)?;
    writer.write(&"xyä".as_bytes()[..3])?;
    assert!(matches!(writer.end(), Err(LobError::Usage(_))));
    let state = store.state();
    assert!(state.finalized.is_empty());
    assert_eq!(state.rollbacks, 1);
    assert_eq!(state.closed, vec![LOC]);
    Ok(())
}

// National-character data is stored as CESU-8 and decodes back to the
// original text.
fn nclob_roundtrip() -> LobResult<()> {
    let store = writable_store();
    let session = test_utils::session(&store);
    let descriptor = LobDescriptor::new(LobTypeId::NCLOB, 8, None);

    let text = "grüße 😀 aus der Ablage";
    let mut writer = LobWriter::open(&session, LOC, descriptor)?;
    writer.write(text.as_bytes())?;
    writer.end()?;

    let stored = store.content(LOC);
    assert_ne!(stored, text.as_bytes(), "CESU-8 differs around the smiley");

    let descriptor = LobDescriptor::new(LobTypeId::NCLOB, 8, Some(stored.len() as u64));
    let reader = LobReader::open(&session, LOC, descriptor)?;
    assert_eq!(reader.into_string()?, text);
    Ok(())
}
