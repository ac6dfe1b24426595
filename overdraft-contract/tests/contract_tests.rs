//! End-to-end hook tests against the in-memory vault

use contracts_api::types::{
    ActivationHookArguments, Balance, BalanceCoordinate, CustomInstruction, DerivedParameterHookArguments,
    Phase, Posting, PostPostingHookArguments, PrePostingHookArguments, RejectionReason, ScheduleField,
    ScheduledEventHookArguments, DEFAULT_ADDRESS, DEFAULT_ASSET,
};
use contracts_api::{CapabilitySet, SmartContract, TzDateTime, Vault};
use overdraft_contract::contract::{ACCRUED_INTEREST_ADDRESS, ACCRUE_INTEREST};
use overdraft_contract::parameters::*;
use overdraft_contract::{Error, MockVault, OverdraftContract};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const CUSTOMER: &str = "customer_1";
const FEE_INCOME: &str = "overdraft_fee_income";
const INTEREST_PAYABLE: &str = "accrued_interest_payable";

fn opened() -> TzDateTime {
    TzDateTime::utc(2024, 1, 1, 9, 0, 0).unwrap()
}

fn now() -> TzDateTime {
    TzDateTime::utc(2024, 1, 10, 12, 0, 0).unwrap()
}

fn vault_with_balance(net: Decimal) -> MockVault {
    let balance = if net.is_sign_negative() {
        Balance::new(Decimal::ZERO, -net, net)
    } else {
        Balance::new(net, Decimal::ZERO, net)
    };
    MockVault::new(CUSTOMER, opened())
        .with_parameter(DENOMINATION, "GBP")
        .unwrap()
        .with_parameter(OVERDRAFT_LIMIT, dec!(500))
        .unwrap()
        .with_parameter(OVERDRAFT_FEE, dec!(15))
        .unwrap()
        .with_parameter(OVERDRAFT_FEE_INCOME_ACCOUNT, FEE_INCOME)
        .unwrap()
        .with_parameter(INTEREST_RATE, dec!(0.05))
        .unwrap()
        .with_parameter(ACCRUED_INTEREST_PAYABLE_ACCOUNT, INTEREST_PAYABLE)
        .unwrap()
        .with_balance(BalanceCoordinate::committed_default("GBP"), now(), balance)
        .unwrap()
}

fn payment(denomination: &str, amount: Decimal) -> CustomInstruction {
    CustomInstruction::new(vec![
        Posting::new(false, amount, denomination, CUSTOMER, DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed).unwrap(),
        Posting::new(true, amount, denomination, "merchant", DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed).unwrap(),
    ])
    .unwrap()
}

#[test]
fn test_metadata_validates() {
    let contract = OverdraftContract::new().unwrap();
    let metadata = contract.metadata();

    assert_eq!(metadata.event_types[0].name, ACCRUE_INTEREST);
    metadata.validate(&CapabilitySet::default()).unwrap();

    let json = serde_json::to_string(metadata).unwrap();
    assert!(json.contains("\"scheduled_event\""));
}

#[test]
fn test_activation_schedules_daily_accrual() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(Decimal::ZERO);

    let args = ActivationHookArguments::new(opened()).unwrap();
    let result = contract.activation_hook(&vault, &args).unwrap().unwrap();
    result.validate().unwrap();

    let event = &result.scheduled_events_return_value[ACCRUE_INTEREST];
    assert_eq!(event.start_datetime, Some(opened()));
    let expression = event.expression.as_ref().unwrap();
    assert_eq!(expression.hour, Some(ScheduleField::Int(0)));
    assert_eq!(expression.minute, Some(ScheduleField::Int(0)));
    assert_eq!(expression.second, Some(ScheduleField::Int(0)));
    assert!(expression.day.is_none());
}

#[test]
fn test_pre_posting_rejects_wrong_denomination() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(dec!(100));

    let args = PrePostingHookArguments::new(now(), vec![payment("USD", dec!(20))]).unwrap();
    let result = contract.pre_posting_hook(&vault, &args).unwrap().unwrap();
    let rejection = result.rejection.unwrap();
    assert_eq!(rejection.reason_code, RejectionReason::WrongDenomination);
    assert!(rejection.message.contains("must be in GBP"));

    let args = PrePostingHookArguments::new(now(), vec![payment("GBP", dec!(20))]).unwrap();
    assert!(contract.pre_posting_hook(&vault, &args).unwrap().is_none());
}

#[test]
fn test_pre_posting_ignores_other_accounts() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(dec!(100));

    let other = CustomInstruction::new(vec![
        Posting::new(true, dec!(5), "EUR", "a", DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed).unwrap(),
        Posting::new(false, dec!(5), "EUR", "b", DEFAULT_ADDRESS, DEFAULT_ASSET, Phase::Committed).unwrap(),
    ])
    .unwrap();
    let args = PrePostingHookArguments::new(now(), vec![other]).unwrap();
    assert!(contract.pre_posting_hook(&vault, &args).unwrap().is_none());
}

#[test]
fn test_post_posting_charges_fee_beyond_limit() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(dec!(-520));

    let args = PostPostingHookArguments::new(now(), vec![payment("GBP", dec!(40))]).unwrap();
    let result = contract.post_posting_hook(&vault, &args).unwrap().unwrap();
    result.validate().unwrap();

    assert_eq!(result.posting_instructions_directives.len(), 1);
    let directive = &result.posting_instructions_directives[0];
    assert_eq!(
        directive.client_batch_id.as_deref(),
        Some(format!("OVERDRAFT_FEE_{}", vault.hook_execution_id()).as_str())
    );
    assert_eq!(directive.value_datetime, Some(now()));

    let postings = &directive.posting_instructions[0].postings;
    let customer = postings.iter().find(|p| p.account_id == CUSTOMER).unwrap();
    let income = postings.iter().find(|p| p.account_id == FEE_INCOME).unwrap();
    assert!(!customer.credit);
    assert!(income.credit);
    assert_eq!(customer.amount, dec!(15));
    assert_eq!(income.amount, dec!(15));

    let effect = directive.balances(CUSTOMER, vault.tside()).unwrap();
    assert_eq!(effect.get(&BalanceCoordinate::committed_default("GBP")).net, dec!(-15));
}

#[test]
fn test_post_posting_within_limit_is_free() {
    let contract = OverdraftContract::new().unwrap();

    for net in [dec!(-500), dec!(-120.50), dec!(300)] {
        let vault = vault_with_balance(net);
        let args = PostPostingHookArguments::new(now(), vec![payment("GBP", dec!(10))]).unwrap();
        assert!(contract.post_posting_hook(&vault, &args).unwrap().is_none(), "net {}", net);
    }
}

#[test]
fn test_scheduled_accrual() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(dec!(1000));

    let args = ScheduledEventHookArguments::new(now(), ACCRUE_INTEREST).unwrap();
    let result = contract.scheduled_event_hook(&vault, &args).unwrap().unwrap();
    result.validate().unwrap();

    let instruction = &result.posting_instructions_directives[0].posting_instructions[0];
    assert_eq!(instruction.postings.len(), 2);
    for posting in &instruction.postings {
        assert_eq!(posting.amount, dec!(0.13699));
        assert_eq!(posting.account_address, ACCRUED_INTEREST_ADDRESS);
    }
    let customer = instruction.postings.iter().find(|p| p.account_id == CUSTOMER).unwrap();
    assert!(customer.credit);
    assert!(instruction.postings.iter().any(|p| p.account_id == INTEREST_PAYABLE && !p.credit));
}

#[test]
fn test_no_accrual_when_overdrawn() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(dec!(-50));

    let args = ScheduledEventHookArguments::new(now(), ACCRUE_INTEREST).unwrap();
    assert!(contract.scheduled_event_hook(&vault, &args).unwrap().is_none());
}

#[test]
fn test_unknown_event_type_ignored() {
    let contract = OverdraftContract::new().unwrap();
    let vault = MockVault::new(CUSTOMER, opened());

    let args = ScheduledEventHookArguments::new(now(), "MONTHLY_FEE").unwrap();
    assert!(contract.scheduled_event_hook(&vault, &args).unwrap().is_none());
}

#[test]
fn test_derived_available_balance() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(dec!(-120));

    let args = DerivedParameterHookArguments::new(now()).unwrap();
    let result = contract.derived_parameter_hook(&vault, &args).unwrap().unwrap();
    result.validate().unwrap();
    assert_eq!(
        result.parameters_return_value[AVAILABLE_BALANCE].as_decimal(),
        Some(dec!(380))
    );
}

#[test]
fn test_derived_available_balance_overflow() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(Decimal::MAX);

    let args = DerivedParameterHookArguments::new(now()).unwrap();
    let err = contract.derived_parameter_hook(&vault, &args).unwrap_err();
    assert!(matches!(err, Error::Overflow(_)));
}

#[test]
fn test_missing_parameter_is_reported() {
    let contract = OverdraftContract::new().unwrap();
    let vault = MockVault::new(CUSTOMER, opened());

    let args = PostPostingHookArguments::new(now(), vec![payment("GBP", dec!(10))]).unwrap();
    let err = contract.post_posting_hook(&vault, &args).unwrap_err();
    assert!(matches!(err, Error::Api(contracts_api::Error::MissingData(_))));
}

#[test]
fn test_wrong_parameter_kind_is_reported() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(dec!(100))
        .with_parameter_at(INTEREST_RATE, now(), "five percent")
        .unwrap();

    let args = ScheduledEventHookArguments::new(now(), ACCRUE_INTEREST).unwrap();
    let err = contract.scheduled_event_hook(&vault, &args).unwrap_err();
    assert!(matches!(err, Error::Parameter(_)));
}

#[test]
fn test_results_serialise_for_host() {
    let contract = OverdraftContract::new().unwrap();
    let vault = vault_with_balance(dec!(-600));

    let args = PostPostingHookArguments::new(now(), vec![payment("GBP", dec!(100))]).unwrap();
    let result = contract.post_posting_hook(&vault, &args).unwrap().unwrap();

    let json = serde_json::to_value(&result).unwrap();
    let posting = &json["posting_instructions_directives"][0]["posting_instructions"][0]["postings"][0];
    assert_eq!(posting["amount"], "15");
    assert_eq!(posting["phase"], "POSTING_PHASE_COMMITTED");
}
