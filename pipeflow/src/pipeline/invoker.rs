//! The composed pipeline and its invocation loop.
//!
//! A call walks the stages strictly in order. Each stage takes its inputs
//! by position from what the previous stage forwarded, falling back to the
//! call's original arguments for positions the previous stage did not fill.
//! The first failure signal ends the call.

use super::{ArityPolicy, PipelineConfig, PipelineOutput};
use crate::core::{Failure, StageOutput, TypeInfo, Value};
use crate::errors::{ArgumentTypeError, ArityError, PipeflowError, TypeMismatchError};
use crate::observability::{
    PipelineSpanAttributes, SpanTimer, StageSpanAttributes, TracingEmitter,
};
use crate::stages::{BoxedStage, Stage, StageSignature};
use std::sync::Arc;
use uuid::Uuid;

/// A callable composition of stages.
///
/// Pipelines hold no state between calls; concurrent calls are as safe as
/// the stages they run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<BoxedStage>,
    signature: StageSignature,
    emitter: Arc<dyn TracingEmitter>,
}

impl Pipeline {
    pub(crate) fn new(
        config: PipelineConfig,
        stages: Vec<BoxedStage>,
        emitter: Arc<dyn TracingEmitter>,
    ) -> Self {
        let signature = composite_signature(&stages, config.arity_policy);
        Self {
            config,
            stages,
            signature,
            emitter,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[BoxedStage] {
        &self.stages
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Number of arguments a call may draw on.
    ///
    /// This is the first stage's arity, widened by any later stage that can
    /// reach past it into the original arguments.
    #[must_use]
    pub fn expected_inputs(&self) -> usize {
        self.signature.arity()
    }

    /// Runs the pipeline.
    ///
    /// # Errors
    ///
    /// * [`PipeflowError::Arity`] if a stage cannot be given enough inputs.
    /// * [`PipeflowError::TypeMismatch`] if an input has the wrong runtime type.
    /// * [`PipeflowError::Stage`] with the stage's own failure, unwrapped.
    pub fn call(&self, args: Vec<Value>) -> Result<PipelineOutput, PipeflowError> {
        let run_id = self
            .emitter
            .enabled()
            .then(|| Uuid::new_v4().to_string());

        let Some(run_id) = run_id else {
            return self.execute(&args, None);
        };

        let attributes = PipelineSpanAttributes::new()
            .with_pipeline_name(&self.config.name)
            .with_run_id(&run_id)
            .with_stage_count(self.stages.len())
            .with_input_count(args.len())
            .to_attributes();
        self.emitter.span_start(&self.config.name, &attributes);
        let timer = SpanTimer::start(&self.config.name);

        let result = self.execute(&args, Some(&run_id));
        match &result {
            Ok(_) => self
                .emitter
                .span_end(&self.config.name, timer.finish(), &attributes),
            Err(e) => self
                .emitter
                .span_error(&self.config.name, &e.to_string(), &attributes),
        }
        result
    }

    /// Alias for [`call`](Self::call).
    pub fn run(&self, args: Vec<Value>) -> Result<PipelineOutput, PipeflowError> {
        self.call(args)
    }

    /// Converts the pipeline into a plain closure.
    pub fn into_fn(
        self,
    ) -> impl Fn(Vec<Value>) -> Result<PipelineOutput, PipeflowError> + Send + Sync + Clone {
        move |args| self.call(args)
    }

    fn execute(
        &self,
        initial: &[Value],
        run_id: Option<&str>,
    ) -> Result<PipelineOutput, PipeflowError> {
        let mut current: Vec<Value> = initial.to_vec();

        for (position, stage) in self.stages.iter().enumerate() {
            let inputs = self.resolve_inputs(position, stage.as_ref(), &current, initial)?;
            tracing::trace!(
                pipeline = %self.config.name,
                position,
                stage = stage.name(),
                inputs = inputs.len(),
                "Invoking stage"
            );

            let span = run_id.map(|id| {
                let attributes = StageSpanAttributes::new(stage.name(), position)
                    .with_run_id(id)
                    .with_arity(inputs.len());
                self.emitter
                    .span_start(stage.name(), &attributes.to_attributes());
                (attributes, SpanTimer::start(stage.name()))
            });

            let result = invoke_stage(position, stage.as_ref(), inputs);

            if let Some((attributes, timer)) = span {
                match &result {
                    Ok(forwarded) => self.emitter.span_end(
                        stage.name(),
                        timer.finish(),
                        &attributes.with_forwarded(forwarded.len()).to_attributes(),
                    ),
                    Err(e) => self.emitter.span_error(
                        stage.name(),
                        &e.to_string(),
                        &attributes.to_attributes(),
                    ),
                }
            }

            current = result?;
        }

        Ok(PipelineOutput::materialize(current))
    }

    fn resolve_inputs(
        &self,
        position: usize,
        stage: &dyn Stage,
        current: &[Value],
        initial: &[Value],
    ) -> Result<Vec<Value>, ArityError> {
        let expected = stage.signature().arity();

        match self.config.arity_policy {
            ArityPolicy::Exact => {
                if current.len() != expected {
                    return Err(ArityError::new(position, stage.name(), expected, current.len()));
                }
                Ok(current.to_vec())
            }
            ArityPolicy::Fallback => (0..expected)
                .map(|j| {
                    current.get(j).or_else(|| initial.get(j)).cloned().ok_or_else(|| {
                        ArityError::new(
                            position,
                            stage.name(),
                            expected,
                            current.len().max(initial.len()),
                        )
                    })
                })
                .collect(),
        }
    }
}

fn invoke_stage(
    position: usize,
    stage: &dyn Stage,
    inputs: Vec<Value>,
) -> Result<Vec<Value>, PipeflowError> {
    let outputs = stage
        .invoke(inputs)
        .map_err(|source| TypeMismatchError::new(position, stage.name(), source))?;
    partition(outputs).map_err(|failure| {
        tracing::trace!(position, stage = stage.name(), error = %failure, "Stage signalled failure");
        PipeflowError::Stage(failure)
    })
}

/// Splits stage outputs into forwarded data, stopping at the first failure.
fn partition(outputs: Vec<StageOutput>) -> Result<Vec<Value>, Failure> {
    let mut forwarded = Vec::with_capacity(outputs.len());
    for output in outputs {
        match output {
            StageOutput::Data(value) => forwarded.push(value),
            StageOutput::Signal(Some(failure)) => return Err(failure),
            StageOutput::Signal(None) => {}
        }
    }
    Ok(forwarded)
}

fn composite_signature(stages: &[BoxedStage], policy: ArityPolicy) -> StageSignature {
    let Some(first) = stages.first() else {
        return StageSignature::default();
    };

    let mut inputs: Vec<TypeInfo> = first.signature().inputs().to_vec();
    if policy == ArityPolicy::Fallback {
        for stage in &stages[1..] {
            let declared = stage.signature().inputs();
            if declared.len() > inputs.len() {
                inputs.extend_from_slice(&declared[inputs.len()..]);
            }
        }
    }

    let outputs = stages
        .last()
        .and_then(|stage| stage.signature().outputs())
        .map(<[TypeInfo]>::to_vec);
    StageSignature::new(inputs, outputs)
}

/// A pipeline can itself be a stage of another pipeline.
///
/// Any error of the inner call is reported as the stage's failure; stage
/// failures keep their original payload.
impl Stage for Pipeline {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn signature(&self) -> &StageSignature {
        &self.signature
    }

    fn invoke(&self, inputs: Vec<Value>) -> Result<Vec<StageOutput>, ArgumentTypeError> {
        let outputs = match self.call(inputs) {
            Ok(output) => output
                .into_values()
                .into_iter()
                .map(StageOutput::Data)
                .chain(std::iter::once(StageOutput::Signal(None)))
                .collect(),
            Err(PipeflowError::Stage(failure)) => vec![StageOutput::Signal(Some(failure))],
            Err(other) => vec![StageOutput::Signal(Some(Failure::new(other)))],
        };
        Ok(outputs)
    }
}

/// Calls a pipeline with plain Rust values.
///
/// ```rust,ignore
/// let output = call_with!(pipeline; 5, 7)?;
/// ```
#[macro_export]
macro_rules! call_with {
    ($pipeline:expr; $($arg:expr),* $(,)?) => {
        $pipeline.call($crate::args![$($arg),*])
    };
}
