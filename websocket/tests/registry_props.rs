//! Property tests: arbitrary interleavings of subscribe / unsubscribe /
//! remove keep the subscription index consistent and never leave empty
//! subscriber sets behind.

use std::sync::Arc;

use gateway_nullables::NullTransport;
use gateway_types::{Account, ConnectionId};
use gateway_websocket::ConnectionRegistry;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Subscribe(usize, Vec<usize>),
    Unsubscribe(usize, Vec<usize>),
    Remove(usize),
}

const CONNECTIONS: usize = 4;
const ACCOUNTS: usize = 5;

fn op_strategy() -> impl Strategy<Value = Op> {
    let accounts = prop::collection::vec(0..ACCOUNTS, 0..4);
    prop_oneof![
        (0..CONNECTIONS, accounts.clone()).prop_map(|(c, a)| Op::Subscribe(c, a)),
        (0..CONNECTIONS, accounts).prop_map(|(c, a)| Op::Unsubscribe(c, a)),
        (0..CONNECTIONS).prop_map(Op::Remove),
    ]
}

fn account(i: usize) -> Account {
    Account::new(format!("acct_{i}"))
}

proptest! {
    #[test]
    fn index_stays_consistent(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut reg = ConnectionRegistry::new();
        let ids: Vec<ConnectionId> = (0..CONNECTIONS)
            .map(|_| reg.register(Arc::new(NullTransport::new().0)))
            .collect();

        for op in ops {
            match op {
                Op::Subscribe(c, a) => {
                    reg.subscribe(ids[c], a.into_iter().map(account));
                }
                Op::Unsubscribe(c, a) => {
                    reg.unsubscribe(ids[c], a.into_iter().map(account));
                }
                Op::Remove(c) => {
                    reg.remove_connection(ids[c]);
                }
            }
            prop_assert!(reg.is_consistent());
        }

        // Broadcast reaches exactly the live subscribers of each account.
        for i in 0..ACCOUNTS {
            let expected = ids
                .iter()
                .filter(|id| reg.is_subscribed(**id, &account(i)))
                .count();
            prop_assert_eq!(reg.subscriber_count(&account(i)), expected);
            prop_assert_eq!(reg.broadcast(&account(i), "frame"), expected);
        }
    }

    #[test]
    fn removing_everyone_empties_the_index(
        subs in prop::collection::vec((0..CONNECTIONS, 0..ACCOUNTS), 0..40)
    ) {
        let mut reg = ConnectionRegistry::new();
        let ids: Vec<ConnectionId> = (0..CONNECTIONS)
            .map(|_| reg.register(Arc::new(NullTransport::new().0)))
            .collect();
        for (c, a) in subs {
            reg.subscribe(ids[c], [account(a)]);
        }
        for id in &ids {
            prop_assert!(reg.remove_connection(*id));
        }
        prop_assert_eq!(reg.account_count(), 0);
        prop_assert!(reg.is_empty());
    }
}
