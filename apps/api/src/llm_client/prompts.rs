// Shared prompt constants.
// Each pipeline stage that calls the model defines its own prompts alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every extraction and analysis prompt.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only use information present in the provided material. \
    Do NOT infer, interpolate, or invent details. \
    If a field cannot be determined, set it to null (or omit it when it is optional).";
