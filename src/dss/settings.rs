use crate::algebra::*;
use crate::ordering::OrderingMethod;
use crate::SettingsError;
use derive_builder::Builder;

#[cfg(feature = "serde")]
use crate::DssError;
#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::{fs::File, io::Read, io::Write};

/// Settings of a [`DssMatrix`](crate::dss::DssMatrix)

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DssSettings<T: FloatT> {
    ///storage engine ("auto", "skyline", "blockgrid")
    #[builder(default = r#""auto".to_string()"#)]
    pub storage_method: String,

    ///ordering heuristic ("auto", "amd", "rcm", "natural")
    #[builder(default = r#""auto".to_string()"#)]
    pub ordering_method: String,

    ///dofs per block of the block sparse grid engine
    #[builder(default = "3")]
    pub block_size: usize,

    ///multiplier on the dense row threshold of AMD
    #[builder(default = "1.5")]
    pub amd_dense_scale: f64,

    ///predicted flops per factor entry above which "auto" storage
    ///picks the block sparse grid engine
    #[builder(default = "40.0")]
    pub auto_block_ratio: f64,

    ///pivots below this magnitude are unstable
    #[builder(default = "(1e-30).as_T()")]
    pub min_pivot: T,

    ///magnitude of regularized pivots
    #[builder(default = "(1e-10).as_T()")]
    pub stabil_pivot: T,

    ///print statistics, pivot warnings and timings
    #[builder(default = "false")]
    pub verbose: bool,
}

impl<T> Default for DssSettings<T>
where
    T: FloatT,
{
    fn default() -> DssSettings<T> {
        DssSettingsBuilder::<T>::default().build().unwrap()
    }
}

impl<T> DssSettings<T>
where
    T: FloatT,
{
    /// Checks string options and the ranges of numeric fields
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_storage_method(&self.storage_method)?;
        validate_ordering_method(&self.ordering_method)?;
        validate_block_size(self.block_size)?;
        validate_amd_dense_scale(self.amd_dense_scale)?;
        validate_auto_block_ratio(self.auto_block_ratio)?;
        validate_pivots(self.min_pivot, self.stabil_pivot)?;
        Ok(())
    }

    /// Ordering used by the skyline (`block = false`) or the block
    /// sparse grid engine.  "auto" reduces the profile for skyline
    /// storage and the fill for block storage.
    pub(crate) fn ordering_for(&self, block: bool) -> OrderingMethod {
        match OrderingMethod::from_name(&self.ordering_method) {
            Some(method) => method,
            None if block => OrderingMethod::Amd,
            None => OrderingMethod::ReverseCuthillMcKee,
        }
    }
}

#[cfg(feature = "serde")]
impl<T> DssSettings<T>
where
    T: FloatT + Serialize + DeserializeOwned,
{
    /// Writes the settings as JSON
    pub fn write_to_file(&self, file: &mut File) -> Result<(), DssError> {
        let json = serde_json::to_string(self).map_err(std::io::Error::from)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Reads and validates settings written by [`write_to_file`](Self::write_to_file).
    /// Missing fields take their default values.
    pub fn read_from_file(file: &mut File) -> Result<Self, DssError> {
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let settings: Self = serde_json::from_str(&buffer).map_err(std::io::Error::from)?;
        settings.validate()?;
        Ok(settings)
    }
}

impl From<SettingsError> for DssSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        DssSettingsBuilderError::ValidationError(e.to_string())
    }
}

impl<T> DssSettingsBuilder<T>
where
    T: FloatT,
{
    /// check that the builder is valid
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(ref storage_method) = self.storage_method {
            validate_storage_method(storage_method)?;
        }
        if let Some(ref ordering_method) = self.ordering_method {
            validate_ordering_method(ordering_method)?;
        }
        if let Some(block_size) = self.block_size {
            validate_block_size(block_size)?;
        }
        if let Some(scale) = self.amd_dense_scale {
            validate_amd_dense_scale(scale)?;
        }
        if let Some(ratio) = self.auto_block_ratio {
            validate_auto_block_ratio(ratio)?;
        }
        let min_pivot = self.min_pivot.unwrap_or_else(|| (1e-30).as_T());
        let stabil_pivot = self.stabil_pivot.unwrap_or_else(|| (1e-10).as_T());
        validate_pivots(min_pivot, stabil_pivot)?;
        Ok(())
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

fn validate_storage_method(storage_method: &str) -> Result<(), SettingsError> {
    match storage_method {
        "auto" | "skyline" | "blockgrid" => Ok(()),
        _ => Err(SettingsError::BadFieldValue("storage_method")),
    }
}

fn validate_ordering_method(ordering_method: &str) -> Result<(), SettingsError> {
    match ordering_method {
        "auto" => Ok(()),
        name if OrderingMethod::from_name(name).is_some() => Ok(()),
        _ => Err(SettingsError::BadFieldValue("ordering_method")),
    }
}

fn validate_block_size(block_size: usize) -> Result<(), SettingsError> {
    if block_size == 0 {
        return Err(SettingsError::BadFieldValue("block_size"));
    }
    Ok(())
}

fn validate_amd_dense_scale(scale: f64) -> Result<(), SettingsError> {
    if !scale.is_finite() {
        return Err(SettingsError::BadFieldValue("amd_dense_scale"));
    }
    Ok(())
}

fn validate_auto_block_ratio(ratio: f64) -> Result<(), SettingsError> {
    if ratio.is_nan() || ratio < 0.0 {
        return Err(SettingsError::BadFieldValue("auto_block_ratio"));
    }
    Ok(())
}

fn validate_pivots<T: FloatT>(min_pivot: T, stabil_pivot: T) -> Result<(), SettingsError> {
    if min_pivot.is_nan() || min_pivot < T::zero() {
        return Err(SettingsError::BadFieldValue("min_pivot"));
    }
    if !(stabil_pivot > T::zero()) || !stabil_pivot.is_finite() {
        return Err(SettingsError::BadFieldValue("stabil_pivot"));
    }
    Ok(())
}

#[test]
fn test_settings_validate() {
    // all standard settings
    let settings = DssSettingsBuilder::<f64>::default().build().unwrap();
    assert_eq!(settings.block_size, 3);
    assert_eq!(settings.storage_method, "auto");
    assert_eq!(settings, DssSettings::default());

    // fail on unknown storage or ordering method
    assert!(DssSettingsBuilder::<f64>::default()
        .storage_method("foo".to_string())
        .build()
        .is_err());
    assert!(DssSettingsBuilder::<f64>::default()
        .ordering_method("metis".to_string())
        .build()
        .is_err());

    // fail on bad numeric values
    assert!(DssSettingsBuilder::<f64>::default().block_size(0).build().is_err());
    assert!(DssSettingsBuilder::<f64>::default().stabil_pivot(0.0).build().is_err());
    assert!(DssSettingsBuilder::<f64>::default().min_pivot(-1.0).build().is_err());

    // directly construct a bad DssSettings and manually check
    let settings = DssSettings::<f64> {
        ordering_method: "foo".to_string(),
        ..DssSettings::default()
    };
    assert_eq!(
        settings.validate(),
        Err(SettingsError::BadFieldValue("ordering_method"))
    );
}

#[test]
fn test_ordering_choice() {
    let settings = DssSettings::<f64>::default();
    assert_eq!(settings.ordering_for(false), OrderingMethod::ReverseCuthillMcKee);
    assert_eq!(settings.ordering_for(true), OrderingMethod::Amd);

    let settings = DssSettings::<f64> {
        ordering_method: "natural".to_string(),
        ..DssSettings::default()
    };
    assert_eq!(settings.ordering_for(true), OrderingMethod::Natural);
}
