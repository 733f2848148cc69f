use std::collections::BTreeMap;

use crate::types::{Mapping, match_types};

use super::{Morphism, MorphismError, MorphismKind};

impl Morphism {
    /// Partially apply `inner`, binding parameter `i` to `bindings[i]`.
    ///
    /// Indices are relative to the parameters `inner` still has. Binding an
    /// already bound morphism is flattened onto its base, so the result never
    /// nests `Binded` inside `Binded`:
    ///
    /// ```text
    /// f : [p0, p1, p2]
    /// bind(f, {1: x})         = Binded(f, {1: x})         params [p0, p2]
    /// bind(that, {1: y})      = Binded(f, {1: x, 2: y})   params [p0]
    /// ```
    ///
    /// Each bound parameter is matched against the argument's purified type
    /// and the resulting mapping is applied to the remaining parameters and
    /// the result.
    pub fn bind(
        inner: &Morphism,
        bindings: BTreeMap<usize, Morphism>,
    ) -> Result<Morphism, MorphismError> {
        let bindings: BTreeMap<usize, Morphism> = bindings
            .into_iter()
            .filter(|(index, _)| *index < inner.param_count())
            .collect();
        if bindings.is_empty() {
            return Err(MorphismError::EmptyBinding {
                morphism: inner.to_string(),
            });
        }

        match inner.kind() {
            MorphismKind::Binded {
                inner: base,
                bindings: existing,
            } => {
                let unbound: Vec<usize> = (0..base.param_count())
                    .filter(|index| !existing.contains_key(index))
                    .collect();
                let mut merged = existing.clone();
                for (index, arg) in bindings {
                    merged.insert(unbound[index], arg);
                }
                Self::bind_base(base, merged)
            }
            _ => Self::bind_base(inner, bindings),
        }
    }

    fn bind_base(
        base: &Morphism,
        bindings: BTreeMap<usize, Morphism>,
    ) -> Result<Morphism, MorphismError> {
        let mut mapping = Mapping::empty();
        for (index, arg) in &bindings {
            let mismatch = |err| MorphismError::ArgumentMismatch {
                morphism: base.to_string(),
                index: *index,
                source: err,
            };
            let found = match_types(&base.params()[*index], &arg.purified()).map_err(mismatch)?;
            mapping = mapping.merge(found).map_err(mismatch)?;
        }

        let params = base
            .params()
            .iter()
            .enumerate()
            .filter(|(index, _)| !bindings.contains_key(index))
            .map(|(_, param)| mapping.apply(param))
            .collect();
        let result = mapping.apply(base.result());

        Ok(Morphism::from_parts(
            MorphismKind::Binded {
                inner: base.clone(),
                bindings,
            },
            params,
            result,
        ))
    }

    /// Bind a single parameter.
    pub fn apply_at(&self, index: usize, arg: Morphism) -> Result<Morphism, MorphismError> {
        Morphism::bind(self, BTreeMap::from([(index, arg)]))
    }
}
