//! Overdraft contract hooks

use crate::interest::{daily_interest, exceeds_overdraft};
use crate::parameters::{self, OverdraftParameters, AVAILABLE_BALANCE, SUPPORTED_DENOMINATIONS};
use crate::{Error, Result};
use contracts_api::types::{
    ActivationHookArguments, ActivationHookResult, BalanceCoordinate, ContractMetadata, CustomInstruction,
    DerivedParameterHookArguments, DerivedParameterHookResult, HistoryWindow, HookDeclaration, HookKind, Phase,
    Posting, PostPostingHookArguments, PostPostingHookResult, PostingInstructionsDirective,
    PrePostingHookArguments, PrePostingHookResult, RejectionReason, Requires, ScheduleExpression, ScheduledEvent,
    ScheduledEventHookArguments, ScheduledEventHookResult, SmartContractEventType, Tside, DEFAULT_ADDRESS,
    DEFAULT_ASSET,
};
use contracts_api::{ApiVersion, CapabilitySet, SmartContract, TzDateTime, Vault};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Version of this contract
pub const CONTRACT_VERSION: &str = "1.0.0";

/// Daily interest accrual event
pub const ACCRUE_INTEREST: &str = "ACCRUE_INTEREST";

/// Address accrued interest is booked to
pub const ACCRUED_INTEREST_ADDRESS: &str = "ACCRUED_INTEREST";

/// Current account with an arranged overdraft and daily interest
#[derive(Debug, Clone)]
pub struct OverdraftContract {
    metadata: ContractMetadata,
    capabilities: CapabilitySet,
}

impl OverdraftContract {
    /// Build and validate the contract declarations
    pub fn new() -> Result<Self> {
        let metadata = ContractMetadata {
            api_version: ApiVersion::V4_0,
            version: CONTRACT_VERSION.to_string(),
            tside: Tside::Liability,
            supported_denominations: SUPPORTED_DENOMINATIONS.iter().map(|d| d.to_string()).collect(),
            parameters: parameters::declarations()?,
            event_types: vec![SmartContractEventType::new(ACCRUE_INTEREST, Vec::new())?],
            data_fetchers: Vec::new(),
            hooks: hook_declarations(),
        };
        let capabilities = CapabilitySet::for_version(metadata.api_version);
        metadata.validate(&capabilities)?;

        info!(
            version = CONTRACT_VERSION,
            parameters = metadata.parameters.len(),
            "Overdraft contract loaded"
        );
        Ok(Self { metadata, capabilities })
    }

    /// Capabilities the contract was validated against
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }
}

fn hook_declarations() -> Vec<HookDeclaration> {
    let parameters_and_balance = Requires {
        parameters: true,
        balances: Some(HistoryWindow::Latest),
        ..Default::default()
    };

    vec![
        HookDeclaration::new(HookKind::Activation),
        HookDeclaration::new(HookKind::DerivedParameter).requires(parameters_and_balance.clone()),
        HookDeclaration::new(HookKind::PrePosting).requires(Requires {
            parameters: true,
            ..Default::default()
        }),
        HookDeclaration::new(HookKind::PostPosting).requires(parameters_and_balance.clone()),
        HookDeclaration::new(HookKind::ScheduledEvent).requires(Requires {
            event_type: Some(ACCRUE_INTEREST.to_string()),
            ..parameters_and_balance
        }),
    ]
}

/// Committed net balance at the default address, including postings at `at`
fn committed_balance(vault: &dyn Vault, denomination: &str, at: &TzDateTime) -> Result<Decimal> {
    let coordinate = BalanceCoordinate::committed_default(denomination);
    match vault.get_balances_timeseries()?.get(&coordinate) {
        Some(series) => Ok(series.at(at, true)?.net),
        None => Ok(Decimal::ZERO),
    }
}

/// Two-leg committed transfer between accounts at the same address
fn transfer(
    amount: Decimal,
    denomination: &str,
    from_account: &str,
    to_account: &str,
    address: &str,
    description: String,
) -> Result<CustomInstruction> {
    let postings = vec![
        Posting::new(false, amount, denomination, from_account, address, DEFAULT_ASSET, Phase::Committed)?,
        Posting::new(true, amount, denomination, to_account, address, DEFAULT_ASSET, Phase::Committed)?,
    ];
    let details = BTreeMap::from([("description".to_string(), description)]);
    Ok(CustomInstruction::with_details(postings, details)?)
}

impl SmartContract for OverdraftContract {
    type Error = crate::Error;

    fn metadata(&self) -> &ContractMetadata {
        &self.metadata
    }

    fn activation_hook(
        &self,
        vault: &dyn Vault,
        args: &ActivationHookArguments,
    ) -> Result<Option<ActivationHookResult>> {
        let accrual = ScheduledEvent::with_expression(
            args.effective_datetime.clone(),
            ScheduleExpression::daily_at(0, 0, 0)?,
        )?;

        info!(
            account_id = vault.account_id(),
            event_type = ACCRUE_INTEREST,
            "Scheduling daily interest accrual"
        );

        let result = ActivationHookResult {
            scheduled_events_return_value: BTreeMap::from([(ACCRUE_INTEREST.to_string(), accrual)]),
            ..Default::default()
        };
        result.check_capabilities(&self.capabilities)?;
        Ok(Some(result))
    }

    fn derived_parameter_hook(
        &self,
        vault: &dyn Vault,
        args: &DerivedParameterHookArguments,
    ) -> Result<Option<DerivedParameterHookResult>> {
        let at = &args.effective_datetime;
        let denomination = parameters::denomination(vault, at)?;
        let net = committed_balance(vault, &denomination, at)?;
        let limit = parameters::overdraft_limit(vault, at)?;
        let available = net
            .checked_add(limit)
            .ok_or_else(|| Error::Overflow(format!("{} + {}", net, limit)))?;

        Ok(Some(DerivedParameterHookResult {
            parameters_return_value: BTreeMap::from([(AVAILABLE_BALANCE.to_string(), available.into())]),
        }))
    }

    fn pre_posting_hook(
        &self,
        vault: &dyn Vault,
        args: &PrePostingHookArguments,
    ) -> Result<Option<PrePostingHookResult>> {
        let denomination = parameters::denomination(vault, &args.effective_datetime)?;

        let wrong = args
            .posting_instructions
            .iter()
            .flat_map(|instruction| &instruction.postings)
            .find(|posting| posting.account_id == vault.account_id() && posting.denomination != denomination);

        match wrong {
            Some(posting) => {
                warn!(
                    account_id = vault.account_id(),
                    denomination = %posting.denomination,
                    "Rejecting posting in unsupported denomination"
                );
                Ok(Some(PrePostingHookResult::reject(
                    format!(
                        "Cannot make transactions in {}; transactions must be in {}.",
                        posting.denomination, denomination
                    ),
                    RejectionReason::WrongDenomination,
                )?))
            }
            None => Ok(None),
        }
    }

    fn post_posting_hook(
        &self,
        vault: &dyn Vault,
        args: &PostPostingHookArguments,
    ) -> Result<Option<PostPostingHookResult>> {
        let params = OverdraftParameters::load(vault, &args.effective_datetime)?;
        let net = committed_balance(vault, &params.denomination, &args.effective_datetime)?;

        if !exceeds_overdraft(net, params.overdraft_limit) || params.overdraft_fee.is_zero() {
            debug!(account_id = vault.account_id(), %net, "Within overdraft limit");
            return Ok(None);
        }

        let fee = transfer(
            params.overdraft_fee,
            &params.denomination,
            vault.account_id(),
            &params.overdraft_fee_income_account,
            DEFAULT_ADDRESS,
            format!("Overdraft fee: balance {} beyond limit {}", net, params.overdraft_limit),
        )?;
        let directive = PostingInstructionsDirective::new(vec![fee], Some(args.effective_datetime.clone()))?
            .with_client_batch_id(format!("OVERDRAFT_FEE_{}", vault.hook_execution_id()))?;

        info!(
            account_id = vault.account_id(),
            %net,
            fee = %params.overdraft_fee,
            "Charging overdraft fee"
        );

        let result = PostPostingHookResult {
            posting_instructions_directives: vec![directive],
            ..Default::default()
        };
        result.check_capabilities(&self.capabilities)?;
        Ok(Some(result))
    }

    fn scheduled_event_hook(
        &self,
        vault: &dyn Vault,
        args: &ScheduledEventHookArguments,
    ) -> Result<Option<ScheduledEventHookResult>> {
        if args.event_type != ACCRUE_INTEREST {
            debug!(event_type = %args.event_type, "Ignoring unknown event type");
            return Ok(None);
        }

        let params = OverdraftParameters::load(vault, &args.effective_datetime)?;
        let net = committed_balance(vault, &params.denomination, &args.effective_datetime)?;
        let interest = daily_interest(net, params.interest_rate)?;

        if interest.is_zero() {
            debug!(account_id = vault.account_id(), %net, "No interest to accrue");
            return Ok(None);
        }

        let accrual = transfer(
            interest,
            &params.denomination,
            &params.accrued_interest_payable_account,
            vault.account_id(),
            ACCRUED_INTEREST_ADDRESS,
            format!("Daily interest accrued on balance {}", net),
        )?;
        let directive = PostingInstructionsDirective::new(vec![accrual], Some(args.effective_datetime.clone()))?
            .with_client_batch_id(format!("{}_{}", ACCRUE_INTEREST, vault.hook_execution_id()))?;

        info!(
            account_id = vault.account_id(),
            %net,
            %interest,
            "Accruing daily interest"
        );

        let result = ScheduledEventHookResult {
            posting_instructions_directives: vec![directive],
            ..Default::default()
        };
        result.check_capabilities(&self.capabilities)?;
        Ok(Some(result))
    }
}
