use super::codec::{PositionCodec, XgidCodec};
use super::duckdb::scalar::{
    invoke_unary_varchar_to_bool_nullable, invoke_unary_varchar_to_varchar_nullable,
};
use duckdb::{
    Result,
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
    vtab::arrow::WritableVector,
};
use std::error::Error;

/// `'cube'` or `'checker_play'`; `None` when the identifier does not decode.
pub fn decision_type(codec: &dyn PositionCodec, raw: &str) -> Option<&'static str> {
    codec.decode(raw).ok().map(|position| position.kind.as_str())
}

pub fn is_starting_position(codec: &dyn PositionCodec, raw: &str) -> Option<bool> {
    codec
        .decode(raw)
        .ok()
        .map(|position| codec.is_starting_position(&position))
}

pub struct XgidDecisionTypeScalar;

impl VScalar for XgidDecisionTypeScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        let codec = XgidCodec::new();
        invoke_unary_varchar_to_varchar_nullable(input, output, |raw| {
            decision_type(&codec, raw).map(str::to_string)
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}

pub struct XgidIsStartingPositionScalar;

impl VScalar for XgidIsStartingPositionScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        let codec = XgidCodec::new();
        invoke_unary_varchar_to_bool_nullable(input, output, |raw| {
            is_starting_position(&codec, raw)
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Boolean),
        )]
    }
}
