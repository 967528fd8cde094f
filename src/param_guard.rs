use std::error::Error;

use crate::traits::Fit;

/// A set of hyperparameters whose values have not been checked for validity. A reference to the
/// checked hyperparameters can only be obtained after checking has completed. If the
/// `Fit` trait has been implemented on the checked hyperparameters, it will also be
/// implemented on the unchecked hyperparameters with the checking step done automatically.
///
/// The hyperparameter validation done in `check_ref()` and `check()` should be identical.
pub trait ParamGuard {
    /// The checked hyperparameters
    type Checked;
    /// Error type resulting from failed hyperparameter checking
    type Error: Error;

    /// Checks the hyperparameters and returns a reference to the checked hyperparameters if
    /// successful
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error>;

    /// Checks the hyperparameters and returns the checked hyperparameters if successful
    fn check(self) -> Result<Self::Checked, Self::Error>;

    /// Calls `check()` and unwraps the result
    fn check_unwrap(self) -> Self::Checked
    where
        Self: Sized,
    {
        self.check().unwrap()
    }
}

/// Performs checking step and calls `fit` on the checked hyperparameters. If checking failed, the
/// checking error is converted to the original error type of `Fit` and returned.
impl<R, E, P: ParamGuard> Fit<R, E> for P
where
    P::Checked: Fit<R, E>,
    E: Error + From<crate::error::Error> + From<P::Error>,
{
    type Object = <<P as ParamGuard>::Checked as Fit<R, E>>::Object;

    fn fit(&self, records: &R) -> Result<Self::Object, E> {
        let checked = self.check_ref()?;
        checked.fit(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum CountError {
        #[error("limit cannot be 0")]
        ZeroLimit,
        #[error(transparent)]
        Core(#[from] error::Error),
    }

    struct CountValidParams {
        limit: usize,
    }

    struct CountParams(CountValidParams);

    impl ParamGuard for CountParams {
        type Checked = CountValidParams;
        type Error = CountError;

        fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
            if self.0.limit == 0 {
                Err(CountError::ZeroLimit)
            } else {
                Ok(&self.0)
            }
        }

        fn check(self) -> Result<Self::Checked, Self::Error> {
            self.check_ref()?;
            Ok(self.0)
        }
    }

    impl Fit<Vec<u8>, CountError> for CountValidParams {
        type Object = usize;

        fn fit(&self, records: &Vec<u8>) -> Result<usize, CountError> {
            Ok(records.len().min(self.limit))
        }
    }

    #[test]
    fn unchecked_params_fit_after_checking() {
        let records: Vec<u8> = vec![1, 2, 3];
        let fitted: Result<usize, CountError> =
            CountParams(CountValidParams { limit: 2 }).fit(&records);
        assert_eq!(fitted.unwrap(), 2);
    }

    #[test]
    fn invalid_params_do_not_fit() {
        let records: Vec<u8> = vec![1];
        let res: Result<usize, CountError> =
            CountParams(CountValidParams { limit: 0 }).fit(&records);
        assert!(matches!(res, Err(CountError::ZeroLimit)));
    }
}
