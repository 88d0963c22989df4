use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use rbacadmin_auth::{RoleDraft, UserDraft};
use rbacadmin_infra::kv::InMemoryKeyValueStore;
use rbacadmin_infra::{AdminStores, StoreConfig};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        ..ProptestConfig::default()
    })]

    /// Property: successive creates never hand out the same id twice.
    #[test]
    fn successive_creates_yield_distinct_ids(
        names in proptest::collection::vec("[A-Za-z][A-Za-z ]{0,15}", 1..25)
    ) {
        let rt = runtime();
        let (user_ids, role_ids, listed) = rt.block_on(async {
            let stores = AdminStores::new(Arc::new(InMemoryKeyValueStore::new()), &StoreConfig::default());
            let mut user_ids = Vec::new();
            let mut role_ids = Vec::new();
            for name in &names {
                let role = stores.roles.create(RoleDraft::new(name.clone(), "")).await.unwrap();
                let user = stores
                    .identities
                    .create(UserDraft::new(name.clone(), "someone@example.com", role.id.clone()))
                    .await
                    .unwrap();
                role_ids.push(role.id);
                user_ids.push(user.id);
            }
            let listed = stores.identities.list().await.unwrap().len();
            (user_ids, role_ids, listed)
        });

        let distinct_users: HashSet<_> = user_ids.iter().collect();
        let distinct_roles: HashSet<_> = role_ids.iter().collect();
        prop_assert_eq!(distinct_users.len(), names.len());
        prop_assert_eq!(distinct_roles.len(), names.len());
        prop_assert_eq!(listed, names.len());
    }
}
