//! `params` command: every existing asset route of one family.

use anyhow::Result;

use super::{ParamsArgs, emit_json, load_index};
use crate::asset::{self, AssetFamily};
use crate::config::SiteConfig;
use crate::debug;

pub fn run_params(args: &ParamsArgs, config: &SiteConfig) -> Result<()> {
    let index = load_index(config)?;
    let family = AssetFamily::from(args.family);

    let params = asset::enumerate(&index, family.extension());
    debug!("params"; "{} {} routes over {} pages", params.len(), family, index.pages().len());

    emit_json("params", &params, args.pretty, args.output.as_deref())
}
