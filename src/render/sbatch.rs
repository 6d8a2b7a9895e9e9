/// Values substituted into the sbatch template for one stage.
#[derive(Debug, Clone)]
pub struct SbatchContext {
    pub account: String,
    /// Empty to leave out the mail directives.
    pub mail_user: String,
    pub track: String,
    /// 1-based position of the stage in the resource table.
    pub step_index: usize,
    pub step_num: String,
    pub step_name: String,
    pub step_script: String,
    pub log_name: String,
    pub time: String,
    pub nodes: u32,
    pub ntasks: u32,
    pub ncpus_per_task: u32,
    pub gres: String,
    pub mem_per_cpu: String,
    /// Number of commands in the step script, one array task each.
    pub cmd_num: usize,
}

/// Script skeleton; see `render_sbatch` for the placeholders.
const TEMPLATE: &str = include_str!("sbatch.tmpl");

/// Render a Slurm batch script for one stage.
///
/// The shell body is full of `{}` and `${}`, so placeholders are `__NAME__`
/// tokens replaced in turn rather than `format!()` arguments.
pub fn render_sbatch(ctx: &SbatchContext) -> String {
    let mail = if ctx.mail_user.is_empty() {
        "#SBATCH --mail-type=NONE".to_string()
    } else {
        format!(
            "#SBATCH --mail-user={}\n#SBATCH --mail-type=FAIL",
            ctx.mail_user
        )
    };

    // A bare count means GPUs; a typed spec such as "gpu:v100:1" is kept.
    let gres = if ctx.gres.contains(':') {
        ctx.gres.clone()
    } else {
        format!("gpu:{}", ctx.gres)
    };

    let job_name = format!("{}_{}_{}", ctx.step_index, ctx.step_name, ctx.track);

    TEMPLATE
        .replace("__JOB_NAME__", &job_name)
        .replace("__ACCOUNT__", &ctx.account)
        .replace("__TIME__", &ctx.time)
        .replace("__NODES__", &ctx.nodes.to_string())
        .replace("__NTASKS__", &ctx.ntasks.to_string())
        .replace("__NCPUS__", &ctx.ncpus_per_task.to_string())
        .replace("__GRES__", &gres)
        .replace("__MEM__", &ctx.mem_per_cpu)
        .replace("__LOG_NAME__", &ctx.log_name)
        .replace("__MAIL__", &mail)
        .replace("__CMD_NUM__", &ctx.cmd_num.to_string())
        .replace("__STEP_NUM__", &ctx.step_num)
        .replace("__STEP_NAME__", &ctx.step_name)
        .replace("__STEP_SCRIPT__", &ctx.step_script)
}
