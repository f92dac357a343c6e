//! Static ComfyUI taxonomy: builtin node types, first-party sampler and
//! scheduler tokens, and the fixed tables that drive model extraction and
//! API parameter discovery.
//!
//! Everything in this module is data. The sets are exact and
//! case-sensitive; a node type not listed in [`BUILTIN_NODES`] is treated
//! as a custom node by every other component.

/// Node types shipped with base ComfyUI. Classification is an exact,
/// case-sensitive string match.
pub const BUILTIN_NODES: &[&str] = &[
    "BasicGuider",
    "BasicScheduler",
    "CLIPLoader",
    "CLIPSetLastLayer",
    "CLIPTextEncode",
    "CLIPTextEncodeSDXL",
    "CLIPTextEncodeSDXLRefiner",
    "CLIPVisionEncode",
    "CLIPVisionLoader",
    "CheckpointLoader",
    "CheckpointLoaderSimple",
    "ConditioningAverage",
    "ConditioningCombine",
    "ConditioningConcat",
    "ConditioningSetArea",
    "ConditioningSetAreaPercentage",
    "ConditioningSetMask",
    "ConditioningSetTimestepRange",
    "ConditioningZeroOut",
    "ControlNetApply",
    "ControlNetApplyAdvanced",
    "ControlNetLoader",
    "DiffControlNetLoader",
    "DiffusersLoader",
    "DualCLIPLoader",
    "EmptyImage",
    "EmptyLatentImage",
    "EmptySD3LatentImage",
    "FluxGuidance",
    "GLIGENLoader",
    "GLIGENTextBoxApply",
    "GrowMask",
    "HypernetworkLoader",
    "ImageBatch",
    "ImageBlend",
    "ImageBlur",
    "ImageCompositeMasked",
    "ImageCrop",
    "ImageInvert",
    "ImagePadForOutpaint",
    "ImageQuantize",
    "ImageScale",
    "ImageScaleBy",
    "ImageSharpen",
    "ImageToMask",
    "ImageUpscaleWithModel",
    "InpaintModelConditioning",
    "InvertMask",
    "JoinImageWithAlpha",
    "KSampler",
    "KSamplerAdvanced",
    "KSamplerSelect",
    "LatentBatch",
    "LatentBlend",
    "LatentComposite",
    "LatentCompositeMasked",
    "LatentCrop",
    "LatentFlip",
    "LatentFromBatch",
    "LatentRotate",
    "LatentUpscale",
    "LatentUpscaleBy",
    "LoadImage",
    "LoadImageMask",
    "LoraLoader",
    "LoraLoaderModelOnly",
    "MaskComposite",
    "MaskToImage",
    "ModelMergeBlocks",
    "ModelMergeSimple",
    "ModelSamplingDiscrete",
    "ModelSamplingFlux",
    "PreviewImage",
    "RandomNoise",
    "RepeatImageBatch",
    "RepeatLatentBatch",
    "SamplerCustom",
    "SamplerCustomAdvanced",
    "SaveImage",
    "SaveLatent",
    "SetLatentNoiseMask",
    "SolidMask",
    "SplitImageWithAlpha",
    "StyleModelApply",
    "StyleModelLoader",
    "TomePatchModel",
    "UNETLoader",
    "UpscaleModelLoader",
    "VAEDecode",
    "VAEDecodeTiled",
    "VAEEncode",
    "VAEEncodeForInpaint",
    "VAEEncodeTiled",
    "VAELoader",
    "unCLIPCheckpointLoader",
    "unCLIPConditioning",
];

/// Sampler algorithm names shipped with base ComfyUI.
pub const CORE_SAMPLERS: &[&str] = &[
    "euler",
    "euler_ancestral",
    "heun",
    "heunpp2",
    "dpm_2",
    "dpm_2_ancestral",
    "lms",
    "dpm_fast",
    "dpm_adaptive",
    "dpmpp_2s_ancestral",
    "dpmpp_sde",
    "dpmpp_sde_gpu",
    "dpmpp_2m",
    "dpmpp_2m_sde",
    "dpmpp_2m_sde_gpu",
    "dpmpp_3m_sde",
    "dpmpp_3m_sde_gpu",
    "ddpm",
    "lcm",
    "ddim",
    "uni_pc",
    "uni_pc_bh2",
];

/// Scheduler tokens shipped with base ComfyUI. A scheduler value outside
/// this set usually means a third-party extension patched the sampler's
/// option list.
pub const CORE_SCHEDULERS: &[&str] = &[
    "simple",
    "sgm_uniform",
    "karras",
    "exponential",
    "ddim_uniform",
    "beta",
    "normal",
    "linear_quadratic",
    "kl_optimal",
];

/// Curated mapping of injected scheduler tokens to the extension
/// repository that provides them. Kept deliberately small; entries are
/// added as real-world workflows surface them.
pub const INJECTED_SCHEDULER_MAP: &[(&str, &str, &str)] = &[
    // RES4LYF patches additional beta schedule variants into KSampler.
    (
        "beta57",
        "https://github.com/ClownsharkBatwing/RES4LYF",
        "RES4LYF",
    ),
];

/// Fixed (class_type, input field) -> model category table used by the
/// dependency extractor. Literal string values under these fields are
/// collected as model filenames.
pub const MODEL_FIELD_TABLE: &[(&str, &str, &str)] = &[
    ("CheckpointLoader", "ckpt_name", "checkpoints"),
    ("CheckpointLoaderSimple", "ckpt_name", "checkpoints"),
    ("unCLIPCheckpointLoader", "ckpt_name", "checkpoints"),
    ("VAELoader", "vae_name", "vae"),
    ("LoraLoader", "lora_name", "loras"),
    ("LoraLoaderModelOnly", "lora_name", "loras"),
    ("CLIPLoader", "clip_name", "clip"),
    ("DualCLIPLoader", "clip_name1", "clip"),
    ("DualCLIPLoader", "clip_name2", "clip"),
    ("CLIPVisionLoader", "clip_name", "clip_vision"),
    ("ControlNetLoader", "control_net_name", "controlnet"),
    ("DiffControlNetLoader", "control_net_name", "controlnet"),
    ("UNETLoader", "unet_name", "diffusion_models"),
    ("UpscaleModelLoader", "model_name", "upscale_models"),
    ("StyleModelLoader", "style_model_name", "style_models"),
    ("GLIGENLoader", "gligen_name", "gligen"),
    ("HypernetworkLoader", "hypernetwork_name", "hypernetworks"),
    ("LoadImage", "image", "input_images"),
    ("LoadImageMask", "image", "input_images"),
];

/// Fixed table of (class_type, input field) pairs that are externally
/// settable through the generated workflow API. Consumed by
/// `api::params` to build the request schema.
pub const PARAMETERIZABLE_FIELDS: &[(&str, &str)] = &[
    ("CLIPTextEncode", "text"),
    ("CLIPTextEncodeSDXL", "text_g"),
    ("CLIPTextEncodeSDXL", "text_l"),
    ("KSampler", "seed"),
    ("KSampler", "steps"),
    ("KSampler", "cfg"),
    ("KSampler", "sampler_name"),
    ("KSampler", "scheduler"),
    ("KSampler", "denoise"),
    ("KSamplerAdvanced", "noise_seed"),
    ("KSamplerAdvanced", "steps"),
    ("KSamplerAdvanced", "cfg"),
    ("KSamplerAdvanced", "sampler_name"),
    ("KSamplerAdvanced", "scheduler"),
    ("EmptyLatentImage", "width"),
    ("EmptyLatentImage", "height"),
    ("EmptyLatentImage", "batch_size"),
    ("EmptySD3LatentImage", "width"),
    ("EmptySD3LatentImage", "height"),
    ("LoadImage", "image"),
];

/// Returns true when `class_type` is a node shipped with base ComfyUI.
pub fn is_builtin_node(class_type: &str) -> bool {
    BUILTIN_NODES.contains(&class_type)
}

/// Returns true when `token` is a first-party scheduler value.
pub fn is_core_scheduler(token: &str) -> bool {
    CORE_SCHEDULERS.contains(&token)
}

/// Returns true when `token` is a first-party sampler name.
pub fn is_core_sampler(token: &str) -> bool {
    CORE_SAMPLERS.contains(&token)
}

/// Looks up the model category for a (class_type, field) pair, if any.
pub fn model_category(class_type: &str, field: &str) -> Option<&'static str> {
    MODEL_FIELD_TABLE
        .iter()
        .find(|(ct, f, _)| *ct == class_type && *f == field)
        .map(|(_, _, category)| *category)
}

/// Returns true when a (class_type, field) pair may be exposed as an API
/// parameter.
pub fn is_parameterizable(class_type: &str, field: &str) -> bool {
    PARAMETERIZABLE_FIELDS
        .iter()
        .any(|(ct, f)| *ct == class_type && *f == field)
}

/// Looks up the extension repository injected by a non-core scheduler
/// token, if the token is in the curated map.
pub fn injected_extension_for_scheduler(token: &str) -> Option<(&'static str, &'static str)> {
    INJECTED_SCHEDULER_MAP
        .iter()
        .find(|(t, _, _)| *t == token)
        .map(|(_, url, name)| (*url, *name))
}
