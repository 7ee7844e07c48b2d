//! Staged range query builder.
//!
//! A query is a chain of field selections, each followed by one bound
//! operator. Which operators are available depends on the stage the chain
//! has reached, and each stage is its own type:
//!
//! | after                           | stage       | `and(..)` offers                                  |
//! |---------------------------------|-------------|---------------------------------------------------|
//! | `where`, `equal`                | [`Primary`] | `equal`, `between`, `greater_or_equal`, `less_or_equal` |
//! | `between`, `greater_or_equal`   | [`Secondary`] | `between`, `greater_or_equal`, `less_or_equal`  |
//! | `less_or_equal`                 | [`Tertiary`] | `less_or_equal`                                  |
//!
//! Stages never go back, so an equality constraint can never follow a range
//! constraint. Builders are persistent: every call returns a new value and
//! leaves the receiver usable, so a shared prefix can be extended into
//! several queries.
//!
//! Selecting a field that is already part of the chain fails with
//! [`QueryError::DuplicateField`]; a selector that is not a plain member
//! access fails with [`QueryError::UnsupportedExpression`].
//!
//! [`QueryError::DuplicateField`]: crate::error::QueryError::DuplicateField
//! [`QueryError::UnsupportedExpression`]: crate::error::QueryError::UnsupportedExpression

use std::fmt;
use std::marker::PhantomData;

use crate::error::QueryResult;
use crate::executor::{EntityStream, Repository};
use crate::field::{FieldPath, Selector};
use crate::grammar::{Bound, Constraint, ConstraintChain, Stage};
use crate::query::QuerySpecification;
use crate::traits::{DocumentStore, Entity};
use crate::value::KeyValue;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Primary {}
    impl Sealed for super::Secondary {}
    impl Sealed for super::Tertiary {}
}

/// A builder stage.
pub trait StageMarker: sealed::Sealed + Send + Sync + 'static {
    /// The runtime stage this marker stands for.
    const STAGE: Stage;
}

/// Stages that still accept `between` and `greater_or_equal`.
pub trait AcceptsRange: StageMarker {}

/// Equality prefix stage.
#[derive(Debug, Clone, Copy)]
pub struct Primary;

/// Range stage.
#[derive(Debug, Clone, Copy)]
pub struct Secondary;

/// Upper-bound-only stage.
#[derive(Debug, Clone, Copy)]
pub struct Tertiary;

impl StageMarker for Primary {
    const STAGE: Stage = Stage::Primary;
}

impl StageMarker for Secondary {
    const STAGE: Stage = Stage::Secondary;
}

impl StageMarker for Tertiary {
    const STAGE: Stage = Stage::Tertiary;
}

impl AcceptsRange for Primary {}
impl AcceptsRange for Secondary {}

/// A selected field waiting for its bound.
pub struct FieldOperator<S, E, K, St> {
    repo: Repository<S, E>,
    chain: ConstraintChain,
    field: FieldPath,
    _marker: PhantomData<fn() -> (K, St)>,
}

/// Operator reached from `where` or after `equal`.
pub type PrimaryOperator<S, E, K> = FieldOperator<S, E, K, Primary>;
/// Operator reached after a range bound.
pub type SecondaryOperator<S, E, K> = FieldOperator<S, E, K, Secondary>;
/// Operator reached after `less_or_equal`.
pub type TertiaryOperator<S, E, K> = FieldOperator<S, E, K, Tertiary>;

impl<S, E, K, St> FieldOperator<S, E, K, St>
where
    S: DocumentStore,
    E: Entity,
    K: Into<KeyValue>,
    St: StageMarker,
{
    pub(crate) fn new(repo: Repository<S, E>, chain: ConstraintChain, field: FieldPath) -> Self {
        Self {
            repo,
            chain,
            field,
            _marker: PhantomData,
        }
    }

    /// The selected field.
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    /// Field is at most `value`.
    pub fn less_or_equal(&self, value: impl Into<K>) -> TertiaryExpression<S, E> {
        self.bind(Bound::LessOrEqual(key::<K, _>(value)))
    }

    fn bind<Next: StageMarker>(&self, bound: Bound) -> Expression<S, E, Next> {
        let chain = self.chain.push(Constraint::new(self.field.clone(), bound));
        Expression::new(self.repo.clone(), chain)
    }
}

impl<S, E, K, St> FieldOperator<S, E, K, St>
where
    S: DocumentStore,
    E: Entity,
    K: Into<KeyValue>,
    St: AcceptsRange,
{
    /// Field lies within `[lower, upper]`.
    pub fn between(&self, lower: impl Into<K>, upper: impl Into<K>) -> SecondaryExpression<S, E> {
        self.bind(Bound::Between(key::<K, _>(lower), key::<K, _>(upper)))
    }

    /// Field is at least `value`.
    pub fn greater_or_equal(&self, value: impl Into<K>) -> SecondaryExpression<S, E> {
        self.bind(Bound::GreaterOrEqual(key::<K, _>(value)))
    }
}

impl<S, E, K> FieldOperator<S, E, K, Primary>
where
    S: DocumentStore,
    E: Entity,
    K: Into<KeyValue>,
{
    /// Field equals `value`.
    pub fn equal(&self, value: impl Into<K>) -> PrimaryExpression<S, E> {
        self.bind(Bound::Equal(key::<K, _>(value)))
    }
}

fn key<K, V>(value: V) -> KeyValue
where
    K: Into<KeyValue>,
    V: Into<K>,
{
    let value: K = value.into();
    value.into()
}

impl<S, E, K, St> Clone for FieldOperator<S, E, K, St> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            chain: self.chain.clone(),
            field: self.field.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S, E, K, St> fmt::Debug for FieldOperator<S, E, K, St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOperator")
            .field("chain", &self.chain)
            .field("field", &self.field.to_string())
            .finish()
    }
}

/// A chain whose last field has its bound.
pub struct Expression<S, E, St> {
    repo: Repository<S, E>,
    chain: ConstraintChain,
    _stage: PhantomData<St>,
}

/// Chain ending in equality constraints.
pub type PrimaryExpression<S, E> = Expression<S, E, Primary>;
/// Chain ending in a range constraint.
pub type SecondaryExpression<S, E> = Expression<S, E, Secondary>;
/// Chain ending in an upper-bound-only constraint.
pub type TertiaryExpression<S, E> = Expression<S, E, Tertiary>;

impl<S, E, St> Expression<S, E, St>
where
    S: DocumentStore,
    E: Entity,
    St: StageMarker,
{
    pub(crate) fn new(repo: Repository<S, E>, chain: ConstraintChain) -> Self {
        Self {
            repo,
            chain,
            _stage: PhantomData,
        }
    }

    /// Select the next field.
    pub fn and<K>(&self, selector: Selector<E, K>) -> QueryResult<FieldOperator<S, E, K, St>>
    where
        K: Into<KeyValue>,
    {
        let field = selector.path()?;
        self.chain.check_field(&field)?;
        Ok(FieldOperator::new(self.repo.clone(), self.chain.clone(), field))
    }

    /// The constraints collected so far.
    pub fn chain(&self) -> &ConstraintChain {
        &self.chain
    }

    /// Compile without running anything.
    pub fn spec(&self) -> QuerySpecification {
        self.repo.compile(&self.chain)
    }

    /// Run the query and stream the matching entities.
    pub async fn list(&self) -> QueryResult<EntityStream<E>> {
        self.repo.execute(&self.spec()).await
    }

    /// Run the query and collect every matching entity.
    pub async fn exec(&self) -> QueryResult<Vec<E>> {
        self.list().await?.try_collect_vec().await
    }
}

impl<S, E, St> Clone for Expression<S, E, St> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            chain: self.chain.clone(),
            _stage: PhantomData,
        }
    }
}

impl<S, E, St: StageMarker> fmt::Debug for Expression<S, E, St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("stage", &St::STAGE)
            .field("chain", &self.chain)
            .finish()
    }
}
