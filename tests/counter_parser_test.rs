//! End-to-end checks of the counter log parser with realistic transaction
//! log sequences.

use solana_event_indexer::{CounterLogParser, EventCodec, EventPayload, EventType};
use solana_sdk::pubkey::Pubkey;

#[test]
fn test_increment_transaction_log_sequence() {
    let counter_pk = Pubkey::new_unique();
    let logs = vec![
        "Program CounzVsCGF4VzNkAwePKC9mXr6YWiFYF4kLW6YdV8Cc invoke [1]".to_string(),
        "Program log: Instruction: Increment".to_string(),
        "Program log: Counter incremented to: 42".to_string(),
        "Program CounzVsCGF4VzNkAwePKC9mXr6YWiFYF4kLW6YdV8Cc consumed 1200 of 200000 compute units"
            .to_string(),
        "Program CounzVsCGF4VzNkAwePKC9mXr6YWiFYF4kLW6YdV8Cc success".to_string(),
    ];

    let parser = CounterLogParser::new();
    let events = parser.extract(&logs, &[counter_pk]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::CounterIncremented);
    assert_eq!(
        events[0].raw.as_deref(),
        Some("Program log: Counter incremented to: 42")
    );
    let EventPayload::CounterIncremented(ref payload) = events[0].payload else {
        panic!("expected increment payload");
    };
    assert_eq!(payload.counter, counter_pk);
    assert_eq!(payload.old_value, 41);
    assert_eq!(payload.new_value, 42);
}

#[test]
fn test_payment_transaction_maps_positional_accounts() {
    let counter_pk = Pubkey::new_unique();
    let payer_pk = Pubkey::new_unique();
    let fee_pk = Pubkey::new_unique();
    let logs = vec![
        "Program log: Instruction: PayAndIncrement".to_string(),
        "Program log: Payment of 5000000 lamports received. Counter incremented to: 7".to_string(),
    ];

    let parser = CounterLogParser::new();
    let events = parser.extract(&logs, &[counter_pk, payer_pk, fee_pk]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::CounterPaymentReceived);
    let EventPayload::CounterPaymentReceived(ref payload) = events[0].payload else {
        panic!("expected payment payload");
    };
    assert_eq!(payload.counter, counter_pk);
    assert_eq!(payload.payer, Some(payer_pk));
    assert_eq!(payload.fee_collector, Some(fee_pk));
    assert_eq!(payload.payment, 5_000_000);
    assert_eq!(payload.new_count, 7);
}

#[test]
fn test_full_counter_lifecycle_in_order() {
    let counter_pk = Pubkey::new_unique();
    let logs = vec![
        "Program log: Counter initialized".to_string(),
        "Program log: Counter incremented to: 1".to_string(),
        "Program log: Added 9 to counter. New value: 10".to_string(),
        "Program log: Counter decremented to: 9".to_string(),
        "Program log: Counter reset".to_string(),
    ];

    let parser = CounterLogParser::new();
    let events = parser.extract(&logs, &[counter_pk]);

    let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        kinds,
        vec![
            EventType::CounterInitialized,
            EventType::CounterIncremented,
            EventType::CounterAdded,
            EventType::CounterDecremented,
            EventType::CounterReset,
        ]
    );
}

#[test]
fn test_number_of_events_equals_recognized_lines() {
    let counter_pk = Pubkey::new_unique();
    let logs = vec![
        "Program log: Counter incremented to: 1".to_string(),
        "Program log: something the pattern set does not know".to_string(),
        "Program log: Counter incremented to: 2".to_string(),
        "Program data: SGVsbG8=".to_string(),
    ];

    let parser = CounterLogParser::new();
    assert_eq!(parser.extract(&logs, &[counter_pk]).len(), 2);
}
