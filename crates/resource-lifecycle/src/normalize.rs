//! Shapes outcomes into callback responses.

use cfn_resource_core::{
    CallbackResponse, InvocationContext, Outcome, ResourceRequest, ResponseData, ResponseStatus,
};

use crate::identity::resolve_physical_id;

/// Build the log viewer link for an invocation.
pub fn log_viewer_url(region: &str, log_group_name: &str, log_stream_name: &str) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/cloudwatch/home?region={region}#logsV2:log-groups/log-group/{group}/log-events/{stream}",
        region = region,
        group = urlencoding::encode(log_group_name),
        stream = urlencoding::encode(log_stream_name),
    )
}

/// Maps outcomes of one request to the wire format.
#[derive(Debug, Clone, Copy)]
pub struct ResponseNormalizer<'a> {
    request: &'a ResourceRequest,
    context: &'a InvocationContext,
    region: &'a str,
}

impl<'a> ResponseNormalizer<'a> {
    /// Create a normalizer for one request.
    pub fn new(
        request: &'a ResourceRequest,
        context: &'a InvocationContext,
        region: &'a str,
    ) -> Self {
        Self {
            request,
            context,
            region,
        }
    }

    /// Resolve the physical id to report.
    pub fn resolve_physical_id(&self, hint: Option<&str>) -> String {
        resolve_physical_id(hint, self.request, self.context)
    }

    /// Build the response for an outcome.
    pub fn build(&self, outcome: Outcome) -> CallbackResponse {
        match outcome {
            Outcome::Success {
                physical_resource_id,
                data,
                no_echo,
            } => self.build_success(physical_resource_id.as_deref(), data, no_echo),
            Outcome::Failure {
                reason,
                physical_resource_id,
            } => self.build_failure(&reason, physical_resource_id.as_deref()),
        }
    }

    /// Build a SUCCESS response.
    pub fn build_success(
        &self,
        physical_resource_id: Option<&str>,
        data: Option<ResponseData>,
        no_echo: Option<bool>,
    ) -> CallbackResponse {
        CallbackResponse {
            status: ResponseStatus::Success,
            reason: None,
            physical_resource_id: self.resolve_physical_id(physical_resource_id),
            stack_id: self.request.stack_id.clone(),
            request_id: self.request.request_id.clone(),
            logical_resource_id: self.request.logical_resource_id.clone(),
            data,
            no_echo,
        }
    }

    /// Build a FAILED response.
    ///
    /// The reason is followed by a blank line and a link to the
    /// invocation's logs. The link is informational only.
    pub fn build_failure(&self, reason: &str, physical_resource_id: Option<&str>) -> CallbackResponse {
        let url = log_viewer_url(
            self.region,
            &self.context.log_group_name,
            &self.context.log_stream_name,
        );

        CallbackResponse {
            status: ResponseStatus::Failed,
            reason: Some(format!("{}\n\nCloudwatch Log: {}", reason, url)),
            physical_resource_id: self.resolve_physical_id(physical_resource_id),
            stack_id: self.request.stack_id.clone(),
            request_id: self.request.request_id.clone(),
            logical_resource_id: self.request.logical_resource_id.clone(),
            data: None,
            no_echo: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cfn_resource_core::Operation;

    use super::*;
    use crate::identity::CREATE_FAILED_PHYSICAL_ID;

    fn context() -> InvocationContext {
        InvocationContext::new("/aws/lambda/provider", "2024/01/01/[$LATEST]abc", Duration::from_secs(30))
    }

    fn request(operation: Operation) -> ResourceRequest {
        ResourceRequest::new(operation, "StackId", "RequestId", "LogicalResourceId")
    }

    #[test]
    fn test_log_viewer_url_encodes_names() {
        let url = log_viewer_url("eu-west-1", "/aws/lambda/provider", "2024/01/01/[$LATEST]abc");

        assert_eq!(
            url,
            "https://eu-west-1.console.aws.amazon.com/cloudwatch/home?region=eu-west-1#logsV2:log-groups/log-group/%2Faws%2Flambda%2Fprovider/log-events/2024%2F01%2F01%2F%5B%24LATEST%5Dabc"
        );
    }

    #[test]
    fn test_build_success_echoes_ids() {
        let request = request(Operation::Create);
        let ctx = context();
        let normalizer = ResponseNormalizer::new(&request, &ctx, "us-east-1");

        let mut data = ResponseData::new();
        data.insert("Arn".to_string(), "arn:1".to_string());
        let response = normalizer.build_success(Some("bucket-1"), Some(data.clone()), Some(true));

        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.physical_resource_id, "bucket-1");
        assert_eq!(response.stack_id, "StackId");
        assert_eq!(response.request_id, "RequestId");
        assert_eq!(response.logical_resource_id, "LogicalResourceId");
        assert_eq!(response.data, Some(data));
        assert_eq!(response.no_echo, Some(true));
        assert!(response.reason.is_none());
    }

    #[test]
    fn test_build_success_create_without_id_uses_log_stream() {
        let request = request(Operation::Create);
        let ctx = InvocationContext::new("logGroupName", "logStreamName", Duration::from_secs(1));
        let normalizer = ResponseNormalizer::new(&request, &ctx, "us-east-1");

        let response = normalizer.build(Outcome::empty_success());
        assert_eq!(response.physical_resource_id, "logStreamName");
    }

    #[test]
    fn test_build_failure_appends_log_link() {
        let request = request(Operation::Update {
            physical_resource_id: "existing".to_string(),
            old_resource_properties: Default::default(),
        });
        let ctx = context();
        let normalizer = ResponseNormalizer::new(&request, &ctx, "eu-west-1");

        let response = normalizer.build(Outcome::failure("boom", None));
        let reason = response.reason.unwrap();

        assert_eq!(response.status, ResponseStatus::Failed);
        assert_eq!(response.physical_resource_id, "existing");
        assert!(reason.starts_with("boom\n\nCloudwatch Log: https://eu-west-1.console.aws.amazon.com/"));
        assert!(response.data.is_none());
        assert!(response.no_echo.is_none());
    }

    #[test]
    fn test_build_failure_uses_hint() {
        let request = request(Operation::Create);
        let ctx = context();
        let normalizer = ResponseNormalizer::new(&request, &ctx, "us-east-1");

        let response = normalizer.build(Outcome::failure(
            "Create failed",
            Some(CREATE_FAILED_PHYSICAL_ID.to_string()),
        ));
        assert_eq!(response.physical_resource_id, CREATE_FAILED_PHYSICAL_ID);
    }
}
