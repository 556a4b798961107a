use std::{future::Future, sync::Arc};

use tokio::{
    sync::{AcquireError, Semaphore},
    task::{JoinError, JoinSet},
};

/// Runs at most `max_tasks` futures at once and hands back their outputs in
/// submission order. With a single task, each future finishes before the next
/// one starts.
pub struct OrderedTasks<T> {
    semaphore: Arc<Semaphore>,
    join_set: JoinSet<(usize, T)>,
    ready: Vec<(usize, T)>,
    next_index: usize,
}

impl<T: Send + 'static> OrderedTasks<T> {
    pub fn new(max_tasks: usize) -> Self {
        let semaphore = Arc::new(Semaphore::new(max_tasks.max(1)));
        OrderedTasks {
            semaphore,
            join_set: JoinSet::new(),
            ready: vec![],
            next_index: 0,
        }
    }

    pub async fn spawn<F>(&mut self, task: F) -> Result<(), AcquireError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permit = self.semaphore.clone().acquire_owned().await?;
        let index = self.take_index();
        self.join_set.spawn(async move {
            let value = task.await;
            drop(permit);
            (index, value)
        });
        Ok(())
    }

    /// Records a value that needs no work, keeping its place in the order.
    pub fn push_ready(&mut self, value: T) {
        let index = self.take_index();
        self.ready.push((index, value));
    }

    pub async fn join_all(mut self) -> Result<Vec<T>, JoinError> {
        while let Some(result) = self.join_set.join_next().await {
            self.ready.push(result?);
        }

        self.ready.sort_unstable_by_key(|(index, _)| *index);
        Ok(self.ready.into_iter().map(|(_, value)| value).collect())
    }

    fn take_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }
}
