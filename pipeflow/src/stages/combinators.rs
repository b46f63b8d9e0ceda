//! Ready-made collection stages.
//!
//! Each helper returns a closure that can be handed straight to
//! [`PipelineBuilder::stage`](crate::pipeline::PipelineBuilder::stage).

use crate::core::Single;

/// Keeps the elements matching `predicate`.
pub fn filter<T, P>(predicate: P) -> impl Fn(Vec<T>) -> Vec<T> + Send + Sync + Clone
where
    P: Fn(&T) -> bool + Send + Sync + Clone,
{
    move |items| items.into_iter().filter(|item| predicate(item)).collect()
}

/// Applies `f` to every element.
pub fn map<T, U, F>(f: F) -> impl Fn(Vec<T>) -> Vec<U> + Send + Sync + Clone
where
    F: Fn(T) -> U + Send + Sync + Clone,
{
    move |items| items.into_iter().map(&f).collect()
}

/// Folds the elements into a single value.
pub fn reduce<T, A, F>(init: A, f: F) -> impl Fn(Vec<T>) -> Single<A> + Send + Sync + Clone
where
    A: Clone + Send + Sync,
    F: Fn(A, T) -> A + Send + Sync + Clone,
{
    move |items| Single(items.into_iter().fold(init.clone(), &f))
}

/// Observes a value and forwards it unchanged.
pub fn tap<T, F>(f: F) -> impl Fn(T) -> Single<T> + Send + Sync + Clone
where
    F: Fn(&T) + Send + Sync + Clone,
{
    move |value| {
        f(&value);
        Single(value)
    }
}
