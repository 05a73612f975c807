use std::sync::Arc;

use axum_test::TestServer;
use chrono::{NaiveDate, NaiveTime};
use skillsession_api::{ApiState, build_router};
use skillsession_core::{
    models::slot::{Slot, SlotStatus},
    slotting::SlotPolicy,
};
use skillsession_db::{MemoryDocumentStore, repositories::slot};

pub struct TestContext {
    pub store: Arc<MemoryDocumentStore>,
    pub state: Arc<ApiState>,
    pub server: TestServer,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(MemoryDocumentStore::default(), SlotPolicy::default())
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self::build(MemoryDocumentStore::with_page_size(page_size), SlotPolicy::default())
    }

    pub fn with_policy(policy: SlotPolicy) -> Self {
        Self::build(MemoryDocumentStore::default(), policy)
    }

    fn build(store: MemoryDocumentStore, policy: SlotPolicy) -> Self {
        let store = Arc::new(store);
        let mut state = ApiState::new(store.clone());
        state.slot_policy = policy;
        let state = Arc::new(state);
        let server = TestServer::new(build_router(state.clone())).unwrap();

        Self { store, state, server }
    }

    /// Stores a slot directly, bypassing availability generation.
    pub async fn seed_slot(&self, slot: &Slot) {
        slot::create_slots(self.store.as_ref(), "slots", std::slice::from_ref(slot))
            .await
            .unwrap();
    }

    pub async fn slot_status(&self, slot_id: &str) -> Option<SlotStatus> {
        slot::get_slot(self.store.as_ref(), "slots", slot_id)
            .await
            .unwrap()
            .map(|s| s.status)
    }
}

pub fn slot_on(date: &str, start: &str, end: &str, tutor: &str, sequence: u32, status: SlotStatus) -> Slot {
    Slot {
        id: format!("S{}{}{}", sequence, date, tutor),
        tutor_id: tutor.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
        end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        status,
    }
}
