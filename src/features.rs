use ndarray::Array2;

use crate::{
    error::{Error, Result},
    trainer::ParagraphVectors,
};

/// Build a feature matrix from per-tag vector lookups, one row per tag in
/// the given order.
///
/// A tag without a trained vector fails with [`Error::NotFound`] naming
/// the tag.
pub fn features(
    model: &ParagraphVectors,
    tags: &[String],
) -> Result<Array2<f32>> {
    let dim = model.dimension();
    let mut data = Vec::with_capacity(tags.len() * dim);
    for tag in tags {
        let vector = model.docvec(tag).ok_or_else(|| Error::NotFound {
            kind: "document tag",
            name: tag.clone(),
        })?;
        data.extend_from_slice(vector);
    }
    Array2::from_shape_vec((tags.len(), dim), data)
        .map_err(|e| Error::Config(format!("feature matrix shape: {e}")))
}

/// Build a labeled (features, labels) pair from tag groups.
///
/// Rows follow tag order within each group, groups in the order given.
pub fn labeled_features(
    model: &ParagraphVectors,
    groups: &[(Vec<String>, f32)],
) -> Result<(Array2<f32>, Vec<f32>)> {
    let dim = model.dimension();
    let total: usize = groups.iter().map(|(tags, _)| tags.len()).sum();

    let mut data = Vec::with_capacity(total * dim);
    let mut labels = Vec::with_capacity(total);
    for (tags, label) in groups {
        for tag in tags {
            let vector =
                model.docvec(tag).ok_or_else(|| Error::NotFound {
                    kind: "document tag",
                    name: tag.clone(),
                })?;
            data.extend_from_slice(vector);
            labels.push(*label);
        }
    }

    let x = Array2::from_shape_vec((total, dim), data)
        .map_err(|e| Error::Config(format!("feature matrix shape: {e}")))?;
    Ok((x, labels))
}

/// All model tags starting with `<prefix>_`, in collection order.
pub fn tags_with_prefix(
    model: &ParagraphVectors,
    prefix: &str,
) -> Vec<String> {
    let needle = format!("{prefix}_");
    model
        .tags()
        .iter()
        .filter(|tag| tag.starts_with(&needle))
        .cloned()
        .collect()
}
