use std::{fmt, sync::Arc};

use anyhow::Result;
use once_cell::sync::OnceCell;

use super::decode::{DecodedInstr, ListingLine, decode};
use super::interp::execute;
use crate::emit::MethodBody;
use crate::method::{Procedure, Signature, bind_arguments};
use crate::typ::DefaultValueResolver;
use crate::val::Value;

/// A procedure synthesized at run time.
///
/// Holds the encoded body; the first call decodes it once and later calls
/// reuse the decoded instructions.
pub struct GeneratedProcedure {
    name: String,
    signature: Signature,
    body: Arc<MethodBody>,
    decoded: OnceCell<Arc<[DecodedInstr]>>,
    resolver: Arc<DefaultValueResolver>,
}

impl GeneratedProcedure {
    pub(crate) fn new(
        name: &str,
        signature: Signature,
        body: MethodBody,
        resolver: Arc<DefaultValueResolver>,
    ) -> Self {
        Self {
            name: name.to_string(),
            signature,
            body: Arc::new(body),
            decoded: OnceCell::new(),
            resolver,
        }
    }

    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    /// Decoded instructions with their byte offsets.
    pub fn disassemble(&self) -> Result<&[DecodedInstr]> {
        let decoded = self
            .decoded
            .get_or_try_init(|| decode(&self.body).map(Arc::from))?;
        Ok(decoded.as_ref())
    }

    pub fn listing(&self) -> Result<Vec<ListingLine>> {
        Ok(self.disassemble()?.iter().map(ListingLine::from).collect())
    }

    pub fn into_arc(self) -> Arc<dyn Procedure> {
        Arc::new(self)
    }
}

impl fmt::Debug for GeneratedProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generated {}{} [{} bytes, {} locals]",
            self.name,
            self.signature,
            self.body.code().len(),
            self.body.locals().len()
        )
    }
}

impl Procedure for GeneratedProcedure {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        let args = bind_arguments(&self.name, &self.signature, args)?;
        let code = self.disassemble()?;
        execute(
            &self.name,
            code,
            self.body.locals(),
            &self.signature.return_type,
            args,
            &self.resolver,
        )
    }
}
