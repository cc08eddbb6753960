//! Integration tests for the token ledger.
//!
//! These walk through the end-to-end scenarios a deployed token has to get
//! right: genesis supply, chained transfers, failed transfers, owner-gated
//! minting, allowance spending, and renouncing ownership.

use tally_ledger::{Address, Amount, Ledger, LedgerError};

/// 50,000 * 10^21 base units: 50 million tokens at 18 decimals.
fn initial_supply() -> Amount {
    Amount::from(50_000u64) * Amount::exp10(21)
}

fn owner() -> Address {
    "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
}

fn addr1() -> Address {
    "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".parse().unwrap()
}

fn addr2() -> Address {
    "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc".parse().unwrap()
}

fn amt(n: u64) -> Amount {
    Amount::from(n)
}

fn deploy() -> Ledger {
    Ledger::new("Tally Token", "TLY", 18, initial_supply(), owner())
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

#[test]
fn genesis_supply_is_credited_to_owner() {
    let ledger = deploy();
    assert_eq!(ledger.total_supply(), initial_supply());
    assert_eq!(ledger.balance_of(&owner()), initial_supply());
    assert_eq!(ledger.owner(), owner());
    assert_eq!(ledger.decimals(), 18);
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[test]
fn transfers_chain_between_accounts() {
    let mut ledger = deploy();

    ledger.connect(owner()).transfer(addr1(), amt(50)).unwrap();
    assert_eq!(ledger.balance_of(&addr1()), amt(50));

    ledger.connect(addr1()).transfer(addr2(), amt(50)).unwrap();
    assert_eq!(ledger.balance_of(&addr2()), amt(50));
    assert_eq!(ledger.balance_of(&addr1()), Amount::zero());
    assert_eq!(ledger.total_supply(), initial_supply());
}

#[test]
fn transfer_without_funds_fails_and_changes_nothing() {
    let mut ledger = deploy();
    let before = ledger.balance_of(&owner());

    let err = ledger.connect(addr1()).transfer(owner(), amt(1)).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    assert_eq!(ledger.balance_of(&owner()), before);
}

// ---------------------------------------------------------------------------
// Minting
// ---------------------------------------------------------------------------

#[test]
fn mint_rejects_zero_address_and_credits_real_accounts() {
    let mut ledger = deploy();

    let err = ledger
        .connect(owner())
        .mint(Address::ZERO, amt(100))
        .unwrap_err();
    assert_eq!(err, LedgerError::InvalidRecipient);
    assert_eq!(ledger.total_supply(), initial_supply());

    ledger.connect(owner()).mint(addr1(), amt(100)).unwrap();
    assert_eq!(ledger.total_supply(), initial_supply() + amt(100));
    assert_eq!(ledger.balance_of(&addr1()), amt(100));
}

#[test]
fn only_owner_can_mint_or_burn() {
    let mut ledger = deploy();
    ledger.connect(owner()).transfer(addr1(), amt(10)).unwrap();

    assert!(matches!(
        ledger.connect(addr1()).mint(addr1(), amt(1)),
        Err(LedgerError::Unauthorized { .. })
    ));
    assert!(matches!(
        ledger.connect(addr1()).burn(addr1(), amt(1)),
        Err(LedgerError::Unauthorized { .. })
    ));

    ledger.connect(owner()).burn(addr1(), amt(4)).unwrap();
    assert_eq!(ledger.balance_of(&addr1()), amt(6));
    assert_eq!(ledger.total_supply(), initial_supply() - amt(4));
}

// ---------------------------------------------------------------------------
// Allowances
// ---------------------------------------------------------------------------

#[test]
fn transfer_from_respects_allowance() {
    let mut ledger = deploy();
    ledger.connect(owner()).approve(addr1(), amt(100)).unwrap();

    let err = ledger
        .connect(addr1())
        .transfer_from(owner(), addr2(), amt(200))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AllowanceExceeded { .. }));
    // Nothing moved.
    assert_eq!(ledger.allowance(&owner(), &addr1()), amt(100));
    assert_eq!(ledger.balance_of(&owner()), initial_supply());
    assert_eq!(ledger.balance_of(&addr2()), Amount::zero());

    ledger
        .connect(addr1())
        .transfer_from(owner(), addr2(), amt(60))
        .unwrap();
    assert_eq!(ledger.allowance(&owner(), &addr1()), amt(40));
    assert_eq!(ledger.balance_of(&addr2()), amt(60));
    assert_eq!(ledger.balance_of(&addr1()), Amount::zero());
}

#[test]
fn approve_overwrites_instead_of_accumulating() {
    let mut ledger = deploy();
    ledger.connect(owner()).approve(addr1(), amt(100)).unwrap();
    ledger.connect(owner()).approve(addr1(), amt(7)).unwrap();
    assert_eq!(ledger.allowance(&owner(), &addr1()), amt(7));
}

#[test]
fn approve_zero_spender_fails() {
    let mut ledger = deploy();
    assert_eq!(
        ledger.connect(owner()).approve(Address::ZERO, amt(1)),
        Err(LedgerError::InvalidSpender)
    );
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[test]
fn renounced_ownership_blocks_privileged_calls_forever() {
    let mut ledger = deploy();
    ledger.connect(owner()).renounce_ownership().unwrap();
    assert_eq!(ledger.owner(), Address::ZERO);

    for caller in [owner(), addr1(), addr2(), Address::ZERO] {
        let mut session = ledger.connect(caller);
        assert!(session.mint(addr1(), amt(1)).unwrap_err().is_authorization());
        assert!(session.burn(owner(), amt(1)).unwrap_err().is_authorization());
        assert!(session
            .transfer_ownership(caller)
            .unwrap_err()
            .is_authorization());
        assert!(session.renounce_ownership().unwrap_err().is_authorization());
    }

    assert_eq!(ledger.owner(), Address::ZERO);
    assert_eq!(ledger.total_supply(), initial_supply());
}

#[test]
fn transferred_ownership_moves_privilege() {
    let mut ledger = deploy();
    ledger.connect(owner()).transfer_ownership(addr1()).unwrap();

    assert!(ledger.connect(owner()).mint(owner(), amt(1)).is_err());
    ledger.connect(addr1()).mint(addr2(), amt(3)).unwrap();
    assert_eq!(ledger.balance_of(&addr2()), amt(3));
}
