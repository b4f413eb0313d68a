use crate::sparse::ConnectivityPattern;
use crate::StructureError;

/// Factorization cost estimate produced alongside an AMD ordering
#[derive(Debug, Clone, Copy, Default)]
pub struct AmdAnalysis {
    /// predicted nonzeros in the strict lower factor
    pub lnz: f64,
    /// predicted divisions plus multiply-subtract pairs of an LDLᵀ
    pub flops: f64,
}

impl AmdAnalysis {
    /// flops per factor entry, large values favour dense block kernels
    pub fn flops_per_entry(&self) -> f64 {
        if self.lnz > 0.0 {
            self.flops / self.lnz
        } else {
            0.0
        }
    }
}

/// Approximate minimum degree ordering of a symmetric pattern
pub(crate) fn amd_order(
    pattern: &ConnectivityPattern,
    amd_dense_scale: f64,
) -> Result<(Vec<usize>, AmdAnalysis), StructureError> {
    let n = pattern.neq();
    if n == 0 {
        return Ok((vec![], AmdAnalysis::default()));
    }

    // computes a permutation using AMD default parameters,
    // with the dense row threshold scaled
    let mut control = ::amd::Control::default();
    control.dense *= amd_dense_scale;
    let (perm, _iperm, info) = ::amd::order(n, pattern.colptr(), pattern.rowval(), &control)
        .map_err(|_| StructureError::OrderingFailed)?;

    let analysis = AmdAnalysis {
        lnz: info.lnz as f64,
        flops: (info.n_div + info.n_mult_subs_ldl) as f64,
    };
    Ok((perm, analysis))
}
