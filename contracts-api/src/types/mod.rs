//! Data model exchanged between a contract and the host
//!
//! Every type offers two construction paths. Validating constructors (`new`,
//! `validated`) and the public `validate` methods enforce field invariants;
//! serde deserialisation and struct literals are trusted and preserve values
//! exactly as the host sent them.

pub mod balances;
pub mod calendars;
pub mod directives;
pub mod hooks;
pub mod metadata;
pub mod parameters;
pub mod postings;
pub mod relative;
pub mod requirements;
pub mod schedules;
pub mod timeseries;

pub use balances::{
    Balance, BalanceCoordinate, BalanceDefaultDict, BalancesObservation, Phase, Tside, DEFAULT_ADDRESS,
    DEFAULT_ASSET,
};
pub use calendars::{CalendarEvent, CalendarEvents};
pub use directives::{
    AccountNotificationDirective, PostingInstructionsDirective, UpdateAccountEventTypeDirective,
    MAX_INSTRUCTIONS_PER_DIRECTIVE,
};
pub use hooks::{
    ActivationHookArguments, ActivationHookResult, ConversionHookArguments, ConversionHookResult,
    DeactivationHookArguments, DeactivationHookResult, DerivedParameterHookArguments,
    DerivedParameterHookResult, PostParameterChangeHookArguments, PostParameterChangeHookResult,
    PostPostingHookArguments, PostPostingHookResult, PreParameterChangeHookArguments,
    PreParameterChangeHookResult, PrePostingHookArguments, PrePostingHookResult, Rejection,
    RejectionReason, ScheduledEventHookArguments, ScheduledEventHookResult,
};
pub use metadata::ContractMetadata;
pub use parameters::{
    DateShape, DenominationShape, NumberShape, OptionalShape, OptionalValue, Parameter, ParameterLevel,
    ParameterUpdatePermission, ParameterValue, Shape, UnionItem, UnionItemValue, UnionShape,
};
pub use postings::{
    check_zero_net, net_by_coordinate, CustomInstruction, Posting, TransactionCode,
    MAX_POSTINGS_PER_INSTRUCTION,
};
pub use relative::{DefinedDateTime, FetchDateTime, Find, Next, Override, Previous, RelativeDateTime, Shift};
pub use requirements::{
    BalancesFilter, BalancesIntervalFetcher, BalancesObservationFetcher, DataFetcher, FetchAccountData,
    HistoryWindow, HookDeclaration, HookKind, PostingsIntervalFetcher, Requires,
};
pub use schedules::{
    EndOfMonthSchedule, ScheduleExpression, ScheduleFailover, ScheduleField, ScheduleSkip, ScheduledEvent,
    SmartContractEventType,
};
pub use timeseries::{
    BalanceTimeseries, DiscreteTimeseries, FlagTimeseries, ParameterTimeseries, Timeseries, TimeseriesItem,
    TimeseriesValue,
};
