//! Client-side optimistic updates, independent of any UI framework.
//!
//! A mutation is applied to the visible state as soon as the request goes out
//! and is either folded into the confirmed state when the server accepts it or
//! dropped when the server rejects it. A refetch replaces the confirmed state
//! but keeps mutations that are still in flight.

type Mutation<S> = Box<dyn Fn(&mut S) + Send + Sync>;

pub struct Optimistic<K, S> {
    confirmed: S,
    pending: Vec<(K, Mutation<S>)>,
}

impl<K: PartialEq, S: Clone> Optimistic<K, S> {
    pub fn new(confirmed: S) -> Self {
        Self {
            confirmed,
            pending: Vec::new(),
        }
    }

    /// Queue `mutation` under request id `id`. Mutations replay in the order
    /// they were applied.
    pub fn apply(&mut self, id: K, mutation: impl Fn(&mut S) + Send + Sync + 'static) {
        self.pending.push((id, Box::new(mutation)));
    }

    /// Confirmed state with every pending mutation replayed on top.
    pub fn view(&self) -> S {
        let mut state = self.confirmed.clone();
        for (_, mutation) in &self.pending {
            mutation(&mut state);
        }
        state
    }

    pub fn confirmed(&self) -> &S {
        &self.confirmed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &K) -> bool {
        self.pending.iter().any(|(key, _)| key == id)
    }

    /// Server accepted `id`: fold it into the confirmed state. Returns false
    /// if no such mutation is pending.
    pub fn confirm(&mut self, id: &K) -> bool {
        match self.take(id) {
            Some(mutation) => {
                mutation(&mut self.confirmed);
                true
            }
            None => false,
        }
    }

    /// Server rejected `id`: discard it so the view reverts.
    pub fn rollback(&mut self, id: &K) -> bool {
        self.take(id).is_some()
    }

    /// Replace the confirmed state with fresh server data.
    pub fn reconcile(&mut self, confirmed: S) {
        self.confirmed = confirmed;
    }

    fn take(&mut self, id: &K) -> Option<Mutation<S>> {
        let index = self.pending.iter().position(|(key, _)| key == id)?;
        Some(self.pending.remove(index).1)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn push(value: &'static str) -> impl Fn(&mut Vec<&'static str>) + Send + Sync {
        move |list| list.push(value)
    }

    #[test]
    fn view_replays_pending_in_order() {
        let mut list = Optimistic::new(vec!["fed"]);
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        list.apply(a, push("walked"));
        list.apply(b, push("played"));

        assert_eq!(list.view(), vec!["fed", "walked", "played"]);
        assert_eq!(list.confirmed(), &vec!["fed"]);
        assert_eq!(list.pending_len(), 2);
    }

    #[test]
    fn confirm_folds_into_confirmed_state() {
        let mut list = Optimistic::new(Vec::new());
        let id = Uuid::now_v7();
        list.apply(id, push("groomed"));

        assert!(list.confirm(&id));
        assert!(!list.is_pending(&id));
        assert_eq!(list.confirmed(), &vec!["groomed"]);
        assert!(!list.confirm(&id));
    }

    #[test]
    fn rollback_reverts_only_that_mutation() {
        let mut list = Optimistic::new(Vec::new());
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        list.apply(a, push("fed"));
        list.apply(b, push("walked"));

        assert!(list.rollback(&a));
        assert_eq!(list.view(), vec!["walked"]);
        assert!(!list.rollback(&a));
    }

    #[test]
    fn reconcile_keeps_in_flight_mutations() {
        let mut list = Optimistic::new(vec!["fed"]);
        let id = Uuid::now_v7();
        list.apply(id, push("walked"));

        list.reconcile(vec!["fed", "bathroom"]);
        assert_eq!(list.view(), vec!["fed", "bathroom", "walked"]);
    }

    #[test]
    fn counter_state() {
        let mut count = Optimistic::new(0_i32);
        count.apply(1_u32, |n| *n += 5);
        count.apply(2_u32, |n| *n *= 2);
        assert_eq!(count.view(), 10);

        count.rollback(&1);
        assert_eq!(count.view(), 0);
        count.reconcile(3);
        assert_eq!(count.view(), 6);
    }
}
