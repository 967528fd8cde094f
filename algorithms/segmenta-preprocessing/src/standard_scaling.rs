//! Standard scaling

use crate::error::{PreprocessingError, Result};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};
use segmenta::traits::{Fit, Transformer};
use segmenta::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Standard scaler: learns the mean and the (population) standard deviation of every feature of
/// a matrix, producing a [fitted standard scaler](FittedStandardScaler) that maps each feature
/// to zero mean and unit variance.
///
/// A feature that is constant over the fitting matrix cannot be scaled to unit variance and is
/// rejected with [`PreprocessingError::DegenerateFeature`].
///
/// ### Example
///
/// ```rust
/// use segmenta::traits::{Fit, Transformer};
/// use segmenta_preprocessing::StandardScaler;
/// use ndarray::array;
///
/// let records = array![[1., -1., 2.], [2., 0., 0.], [0., 1., -1.]];
/// // Learn scaling parameters
/// let scaler = StandardScaler::new().fit(&records).unwrap();
/// // scale records according to parameters
/// let scaled = scaler.transform(&records).unwrap();
/// assert_eq!(scaled.dim(), (3, 3));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        StandardScaler
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, PreprocessingError> for StandardScaler {
    type Object = FittedStandardScaler<F>;

    /// Fits the input matrix according to the standard scaling method. Returns an error if the
    /// matrix has no rows, contains non finite values or has a constant feature.
    fn fit(&self, records: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        if records.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }
        for (index, column) in records.columns().into_iter().enumerate() {
            if column.iter().any(|x| !x.is_finite()) {
                return Err(PreprocessingError::NonFiniteValue(index));
            }
            let first = column[0];
            if column.iter().all(|&x| x == first) {
                return Err(PreprocessingError::DegenerateFeature(index));
            }
        }

        let means = records
            .mean_axis(Axis(0))
            .ok_or(PreprocessingError::NotEnoughSamples)?;
        let std_devs = records.std_axis(Axis(0), F::zero());
        if let Some(index) = std_devs.iter().position(|&s| s <= F::zero()) {
            return Err(PreprocessingError::DegenerateFeature(index));
        }

        Ok(FittedStandardScaler { means, std_devs })
    }
}

/// The result of fitting a [standard scaler](StandardScaler).
///
/// The parameters are frozen: scaling unseen records reuses them and never refits.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FittedStandardScaler<F: Float> {
    means: Array1<F>,
    std_devs: Array1<F>,
}

impl<F: Float> FittedStandardScaler<F> {
    /// Per-feature means of the fitting matrix
    pub fn means(&self) -> &Array1<F> {
        &self.means
    }

    /// Per-feature population standard deviations of the fitting matrix
    pub fn std_devs(&self) -> &Array1<F> {
        &self.std_devs
    }

    pub fn nfeatures(&self) -> usize {
        self.means.len()
    }

    /// Maps standardized records, e.g. centroids, back to the original units
    pub fn inverse_transform(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.check_width(x.ncols())?;
        let mut x = x.to_owned();
        Zip::from(x.columns_mut())
            .and(&self.means)
            .and(&self.std_devs)
            .for_each(|mut col, &mean, &std| col.mapv_inplace(|el| el * std + mean));
        Ok(x)
    }

    fn check_width(&self, found: usize) -> Result<()> {
        if found != self.nfeatures() {
            return Err(PreprocessingError::FeatureCountMismatch {
                expected: self.nfeatures(),
                found,
            });
        }
        Ok(())
    }
}

impl<F: Float, D: Data<Elem = F>> Transformer<&ArrayBase<D, Ix2>, Result<Array2<F>>>
    for FittedStandardScaler<F>
{
    /// Scales every column as `(x - mean) / std` with the fitted parameters
    fn transform(&self, x: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
        self.check_width(x.ncols())?;
        let mut x = x.to_owned();
        Zip::from(x.columns_mut())
            .and(&self.means)
            .and(&self.std_devs)
            .for_each(|mut col, &mean, &std| col.mapv_inplace(|el| (el - mean) / std));
        Ok(x)
    }
}

impl<F: Float, D: Data<Elem = F>> Transformer<&ArrayBase<D, Ix1>, Result<Array1<F>>>
    for FittedStandardScaler<F>
{
    /// Scales a single observation with the fitted parameters
    fn transform(&self, x: &ArrayBase<D, Ix1>) -> Result<Array1<F>> {
        self.check_width(x.len())?;
        Ok((x - &self.means) / &self.std_devs)
    }
}
