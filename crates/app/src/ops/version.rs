use std::convert::Infallible;

use clap::Args;

use common::build_info;

#[derive(Args, Debug, Clone)]
pub struct Version;

impl crate::op::Op for Version {
    type Error = Infallible;
    type Output = String;

    fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        Ok(build_info!().to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::{Op, OpContext};

    #[test]
    fn test_version_reports_build_info() {
        let output = Version.execute(&OpContext::new(None)).unwrap();
        assert!(output.contains("version:"));
        assert!(output.contains("rustc:"));
    }
}
