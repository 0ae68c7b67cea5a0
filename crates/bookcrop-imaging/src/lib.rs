// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bookcrop-imaging — the image codec behind the Book Cropper stages.
//
// Decodes pages, probes their dimensions, crops them to a fixed rectangle,
// turns them upside down, converts them to RGB and encodes them again with the
// format inferred from the file extension.

pub mod processor;

pub use processor::PageImage;
