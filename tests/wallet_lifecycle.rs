//! Account lifecycle across derivation, persistence and reload

mod common;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{FlakyStore, PHRASE};
use plutus_core::store::{
    AccountStore, FileStore, KeyValueStore, MemoryStore, WalletState, ACCOUNTS_KEY, CHAIN_KEY,
    PHRASE_KEY,
};
use plutus_core::wallet::{self, derive, to_seed, RecoveryPhrase};
use plutus_core::{Chain, ErrorCode};

// =============================================================================
// Derivation
// =============================================================================

#[test]
fn test_known_accounts_for_reference_phrase() {
    let phrase = RecoveryPhrase::parse(PHRASE).unwrap();

    let sol: Vec<String> = (0..3)
        .map(|i| wallet::derive_account(&phrase, Chain::Solana, i).unwrap().public_key.clone())
        .collect();
    assert_eq!(
        sol,
        vec![
            "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk",
            "GKreMsHvt8A79VApjboYDq3J4ZCXSJRYYQk9BscMbi1H",
            "9RYreF1nBs8Gvq94ACMBtVSVAVUBKSB9p6xdJBFyGApo",
        ]
    );

    let eth: Vec<String> = (0..3)
        .map(|i| wallet::derive_account(&phrase, Chain::Ethereum, i).unwrap().public_key.clone())
        .collect();
    assert_eq!(
        eth,
        vec![
            "0x2759A6Ad812b8A7B73A63a243816D66F5b72A0A7",
            "0x904f5439276a7CfE0adC19921aa1b604806f4C0d",
            "0xd48228905FFD1C9235AaA5Bb70783c27dE8cc76A",
        ]
    );
}

#[test]
fn test_ten_thousand_indices_never_collide() {
    let seed = to_seed(&RecoveryPhrase::parse(PHRASE).unwrap()).unwrap();

    for chain in Chain::all() {
        let mut seen = HashSet::new();
        for index in 0..10_000 {
            let keys = derive(&seed, chain, index).unwrap();
            assert!(seen.insert(keys.public_key.clone()), "{} index {} collided", chain, index);
        }
    }
}

#[test]
fn test_phrase_rejections() {
    let eleven = PHRASE.rsplit_once(' ').unwrap().0;
    assert!(!wallet::validate_phrase(eleven));

    let thirteen = format!("{} abandon", PHRASE);
    assert!(!wallet::validate_phrase(&thirteen));

    let unknown = PHRASE.replacen("abandon", "abandonx", 1);
    assert!(!wallet::validate_phrase(&unknown));

    let bad_checksum = PHRASE.replace("about", "abandon");
    assert!(!wallet::validate_phrase(&bad_checksum));
    let err = RecoveryPhrase::parse(&bad_checksum).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPhrase);

    assert!(wallet::validate_phrase(PHRASE));
}

// =============================================================================
// Store lifecycle
// =============================================================================

#[test]
fn test_reload_restores_identical_accounts() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = AccountStore::new(storage.clone());
    store.select_chain(Chain::Solana).unwrap();
    store.create_account(Some(PHRASE)).unwrap();
    store.create_account(None).unwrap();

    let reloaded = AccountStore::load(storage);
    assert_eq!(reloaded.state(), WalletState::Populated);
    assert_eq!(reloaded.chain(), Some(Chain::Solana));
    let before: Vec<_> = store.accounts().iter().map(|a| (&a.public_key, &a.private_key)).collect();
    let after: Vec<_> = reloaded.accounts().iter().map(|a| (&a.public_key, &a.private_key)).collect();
    assert_eq!(before, after);
}

#[test]
fn test_private_material_never_persisted() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = AccountStore::new(storage.clone());
    store.select_chain(Chain::Ethereum).unwrap();
    let private_key = store.create_account(Some(PHRASE)).unwrap().private_key.clone();

    let accounts = storage.get(ACCOUNTS_KEY).unwrap().unwrap();
    assert!(!accounts.contains(&private_key));
    assert!(!accounts.contains("abandon"));
    assert!(!accounts.to_lowercase().contains("privatekey"));
}

#[test]
fn test_deleting_last_account_starts_new_lineage() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = AccountStore::new(storage.clone());
    store.select_chain(Chain::Solana).unwrap();
    let first = store.create_account(None).unwrap().public_key.clone();
    let first_phrase = store.phrase().unwrap().clone();

    store.delete_account(&first).unwrap();
    assert_eq!(store.state(), WalletState::Empty);
    assert!(storage.get(PHRASE_KEY).unwrap().is_none());
    assert!(storage.get(CHAIN_KEY).unwrap().is_none());

    store.select_chain(Chain::Solana).unwrap();
    store.create_account(None).unwrap();
    assert_ne!(store.phrase().unwrap(), &first_phrase);
    assert_eq!(store.accounts()[0].account_index(), 0);
}

#[test]
fn test_index_not_reused_after_middle_delete() {
    let mut store = AccountStore::new(Arc::new(MemoryStore::new()));
    store.select_chain(Chain::Solana).unwrap();
    store.create_account(Some(PHRASE)).unwrap();
    let middle = store.create_account(None).unwrap().public_key.clone();
    store.create_account(None).unwrap();

    store.delete_account(&middle).unwrap();
    let next = store.create_account(None).unwrap();
    assert_eq!(next.account_index(), 3);
}

#[test]
fn test_mismatched_phrase_is_rejected() {
    let mut store = AccountStore::new(Arc::new(MemoryStore::new()));
    store.select_chain(Chain::Solana).unwrap();
    store.create_account(None).unwrap();

    let err = store.create_account(Some(PHRASE)).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);
    assert_eq!(store.accounts().len(), 1);
}

#[test]
fn test_chain_switch_rejected_when_populated() {
    let mut store = AccountStore::new(Arc::new(MemoryStore::new()));
    store.select_chain(Chain::Solana).unwrap();
    store.select_chain(Chain::Ethereum).unwrap();
    store.create_account(Some(PHRASE)).unwrap();

    assert!(store.select_chain(Chain::Ethereum).is_ok());
    let err = store.select_chain(Chain::Solana).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);
}

#[test]
fn test_failed_write_leaves_memory_unchanged() {
    let storage = Arc::new(FlakyStore::default());
    let mut store = AccountStore::new(storage.clone());
    store.select_chain(Chain::Solana).unwrap();
    store.create_account(Some(PHRASE)).unwrap();

    storage.fail.store(true, Ordering::SeqCst);
    let err = store.create_account(None).unwrap_err();
    assert_eq!(err.code, ErrorCode::PersistenceError);
    assert_eq!(store.accounts().len(), 1);

    let only = store.accounts()[0].public_key.clone();
    assert!(store.delete_account(&only).is_err());
    assert_eq!(store.state(), WalletState::Populated);
}

// =============================================================================
// Load tolerance
// =============================================================================

#[test]
fn test_corrupt_storage_loads_empty() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(ACCOUNTS_KEY, "{not json").unwrap();
    assert_eq!(AccountStore::load(storage).state(), WalletState::Empty);

    let storage = Arc::new(MemoryStore::new());
    storage
        .set(
            ACCOUNTS_KEY,
            r#"[{"publicKey":"HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk","path":"m/44'/501'/0'/0'","blockchain":"solana"}]"#,
        )
        .unwrap();
    // Accounts without a phrase
    assert_eq!(AccountStore::load(storage).state(), WalletState::Empty);
}

#[test]
fn test_tampered_public_key_loads_empty() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = AccountStore::new(storage.clone());
    store.select_chain(Chain::Solana).unwrap();
    store.create_account(Some(PHRASE)).unwrap();

    let accounts = storage.get(ACCOUNTS_KEY).unwrap().unwrap();
    let tampered = accounts.replace(
        "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk",
        "GKreMsHvt8A79VApjboYDq3J4ZCXSJRYYQk9BscMbi1H",
    );
    storage.set(ACCOUNTS_KEY, &tampered).unwrap();

    assert_eq!(AccountStore::load(storage).state(), WalletState::Empty);
}

#[test]
fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");

    {
        let mut store = AccountStore::new(Arc::new(FileStore::new(&path)));
        store.select_chain(Chain::Ethereum).unwrap();
        store.create_account(Some(PHRASE)).unwrap();
    }

    let reloaded = AccountStore::load(Arc::new(FileStore::new(&path)));
    assert_eq!(reloaded.accounts().len(), 1);
    assert_eq!(
        reloaded.accounts()[0].public_key,
        "0x2759A6Ad812b8A7B73A63a243816D66F5b72A0A7"
    );
}
